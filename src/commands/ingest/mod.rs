mod preprocess;
mod run;

pub use run::run;
