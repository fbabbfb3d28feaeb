use advec_lib::commandline;

fn get_args() -> Vec<String> {
    std::env::args().collect()
}

fn main() {
    let args = commandline::parse(&get_args());
    std::process::exit(commandline::run_with_args(&args));
}
