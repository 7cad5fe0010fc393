pub use super::episodes::Entity as Episodes;
pub use super::media::Entity as Media;
pub use super::movies::Entity as Movies;
pub use super::seasons::Entity as Seasons;
pub use super::series::Entity as Series;
pub use super::users::Entity as Users;
pub use super::watch_history::Entity as WatchHistory;
