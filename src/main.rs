fn main() {
    if let Err(e) = hms_lib::run() {
        eprintln!("hms: {e}");
        std::process::exit(1);
    }
}
