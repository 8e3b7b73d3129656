mod common;

mod evaluation;
mod rescoring;
mod service;
