pub mod server;

/// Actions the binary can execute after argument parsing.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}
