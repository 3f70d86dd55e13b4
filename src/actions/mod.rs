//! Command actions.
//!
//! The dispatcher speaks the answer to each recognized command, fetching news
//! and weather when needed.

mod clock;
mod dispatcher;
mod news;
mod weather;

pub use dispatcher::{Dispatch, Dispatcher, Flow};
pub use news::GoogleNews;
pub use weather::OpenMeteo;

#[cfg(test)]
pub use dispatcher::{NewsSource, WeatherSource};
#[cfg(test)]
pub use news::NewsItem;
#[cfg(test)]
pub use weather::{Reading, WeatherReport};
