mod scan;
mod service;
mod wire;
