fn main() {
    if let Err(err) = bizdash::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
