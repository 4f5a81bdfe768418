pub mod seed;

#[cfg(test)]
mod scenarios;
