// ragdesk-common: wire and domain types shared by the engine and the CLI

pub mod protocol;
pub mod timestamp;
pub mod types;
