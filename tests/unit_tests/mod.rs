mod boundary;
mod config;
mod error;
mod io;
mod mesh;
mod quadrature;
mod transfer;
