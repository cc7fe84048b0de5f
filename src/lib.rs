pub mod ctl;
pub mod net;
pub mod topo;

#[cfg(test)]
mod test;
