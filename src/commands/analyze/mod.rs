mod aggregate;
mod report;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;
