//! Marker traits separating writes from reads
//!
//! Every request type sent through the mediator is tagged as either a
//! [`Command`] (changes state) or a [`Query`] (reads only).

pub trait Command {}

pub trait Query {}
