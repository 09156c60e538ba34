fn main() {
    if let Err(e) = parabench::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
