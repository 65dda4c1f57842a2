mod chrome;
mod request;

pub use chrome::ChromeFetcher;
pub use request::RequestFetcher;
