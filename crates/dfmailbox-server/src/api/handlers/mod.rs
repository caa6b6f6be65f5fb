//! API request handlers

pub mod federation;
pub mod instance;
pub mod plot;

pub use federation::{answer_challenge, ChallengeQuery};
pub use instance::{introduce_instance, lookup_instance, IntroduceRequest};
pub use plot::{get_plot, register_plot, update_plot_instance, PlotInstanceRequest};
