use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    takes_normalizer::cli::run_normalize_takes(std::env::args().skip(1))
}
