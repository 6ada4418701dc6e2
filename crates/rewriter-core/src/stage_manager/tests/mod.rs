// Stage Manager test module
#[cfg(test)]
mod common;
#[cfg(test)]
mod registry_tests;
