//! Interactive front-ends that drive a quest session.

pub mod cli;
