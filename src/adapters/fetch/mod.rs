pub mod reqwest_fetcher;
