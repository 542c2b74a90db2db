use std::process;

fn main() {
    if let Err(err) = globsync::app::run() {
        eprintln!("fatal: {err:#}");
        process::exit(1);
    }
}
