//! SPARQL request domain types

mod args;
mod config;
mod method;
mod prepared;

pub use args::{RequestArg, graph_args};
pub use config::{
    ConcreteRequestConfig, DEFAULT_ACCEPT_GRAPH, DEFAULT_ACCEPT_SELECT, DEFAULT_ACCEPT_UPDATE,
    PlainRequestConfig, RequestConfigLayer,
};
pub use method::HttpMethod;
pub use prepared::{CredentialsMode, FORM_CONTENT_TYPE, PreparedRequest};
