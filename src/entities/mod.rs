pub mod episodes;
pub mod media;
pub mod movies;
pub mod seasons;
pub mod series;
pub mod users;
pub mod watch_history;

pub mod prelude;
