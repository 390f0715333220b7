use buckify::cli;
use buckify::color::ColorString;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("{}", ColorString::error(&format!("Error: {}", e)));

        // Print the error chain
        for cause in e.chain().skip(1) {
            eprintln!("{}", ColorString::error(&format!("Caused by: {}", cause)));
        }

        std::process::exit(1);
    }
}
