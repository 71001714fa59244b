fn main() {
    secretsweep::app::startup::startup();
}
