//! Arrow Flight surface for the bound dataset.
//!
//! One `FlightService` implementation serves three verbs:
//!
//! - `ListFlights(criteria)` — the single bound dataset, row counts
//!   reported as the unknown sentinel (-1); criteria accepted, ignored
//! - `GetFlightInfo(descriptor)` — schema + row count from a footer read
//! - `DoGet(ticket)` — the dataset as a stream of RecordBatches
//!
//! Everything else (`DoPut`, `DoAction`, exchanges) is unimplemented:
//! the dataset is read-only and the server exposes no actions.
//!
//! Storage and Parquet failures never cross the boundary verbatim: the
//! cause is logged and the client sees a generic `unavailable` status —
//! "failed to retrieve flight info" for metadata calls, "failed to
//! retrieve data" for streams (possibly after some batches were already
//! delivered; an abnormal stream end means the partial result is not the
//! whole dataset).

mod server;

pub use server::{serve, FlightServeService};
