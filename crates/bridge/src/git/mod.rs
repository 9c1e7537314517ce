// Git publishing: command worker, SSH transport material, publisher.

pub mod publisher;
pub mod ssh;
pub mod worker;
