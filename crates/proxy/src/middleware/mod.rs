mod upstream;

pub use upstream::{Provider, UpstreamRouter};
