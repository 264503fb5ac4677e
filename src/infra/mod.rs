pub mod robotevents;
