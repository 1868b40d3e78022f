//! Slot Booking - guided medical appointment booking
//!
//! A slot-filling conversation engine: each turn fills, changes or re-asks
//! one of an ordered chain of dependent slots (hospital, specialty, doctor,
//! timeslot), served to chat clients over a WebSocket.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
