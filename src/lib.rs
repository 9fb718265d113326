pub mod error;
pub mod net;
pub mod proto;
pub mod scenario;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
