pub mod customizations;
pub mod docs;

#[cfg(test)]
#[path = "customizations_test.rs"]
mod customizations_test;

#[cfg(test)]
#[path = "docs_test.rs"]
mod docs_test;
