fn main() {
    golden_harness::cli::run();
}
