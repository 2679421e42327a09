//! FlightService implementation bound to a single Parquet dataset.

use std::net::SocketAddr;
use std::pin::Pin;

use arrow_flight::{
    encode::FlightDataEncoderBuilder,
    error::FlightError,
    flight_service_server::{FlightService, FlightServiceServer},
    Action, ActionType, Criteria, Empty, FlightData, FlightDescriptor, FlightEndpoint, FlightInfo,
    HandshakeRequest, HandshakeResponse, PollInfo, PutResult, SchemaAsIpc, SchemaResult, Ticket,
};
use arrow_ipc::writer::IpcWriteOptions;
use futures::{stream, Stream, TryStreamExt};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use tracing::{error, info};

use crate::config::{Compression, ServerConfig};
use crate::storage::{self, BatchStream, DatasetLocation, StorageCredentials};

// =============================================================================
// FLIGHT SERVICE
// =============================================================================

/// Flight service serving exactly one dataset.
///
/// All state is immutable after construction; every call opens its own
/// storage handle, so concurrent calls never share mutable state.
pub struct FlightServeService {
    location: DatasetLocation,
    credentials: StorageCredentials,
    advertised: String,
    batch_size: usize,
    compression: Compression,
}

impl FlightServeService {
    /// Build the service from a validated configuration.
    pub fn new(config: &ServerConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            location: DatasetLocation::parse(&config.dataset_uri)?,
            credentials: config.credentials.clone(),
            advertised: config.advertised_location(),
            batch_size: config.batch_size,
            compression: config.compression,
        })
    }

    /// The endpoint handed out in flight info: a ticket carrying the
    /// dataset URI, served from this node. No redirection or locality
    /// routing — fetch from whoever answered the metadata call.
    fn endpoint(&self) -> FlightEndpoint {
        FlightEndpoint::new()
            .with_ticket(Ticket::new(self.location.uri().to_string()))
            .with_location(self.advertised.clone())
    }

    fn descriptor(&self) -> FlightDescriptor {
        FlightDescriptor::new_path(vec![self.location.key().to_string()])
    }
}

/// Stream type for tonic responses
type TonicStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// Log the real cause, hand the client a generic unavailability signal.
fn metadata_unavailable(err: crate::Error) -> Status {
    error!(error = %err, "failed to read dataset metadata");
    Status::unavailable("failed to retrieve flight info")
}

#[tonic::async_trait]
impl FlightService for FlightServeService {
    type HandshakeStream = TonicStream<HandshakeResponse>;
    type ListFlightsStream = TonicStream<FlightInfo>;
    type DoGetStream = TonicStream<FlightData>;
    type DoPutStream = TonicStream<PutResult>;
    type DoActionStream = TonicStream<arrow_flight::Result>;
    type ListActionsStream = TonicStream<ActionType>;
    type DoExchangeStream = TonicStream<FlightData>;

    async fn handshake(
        &self,
        _request: Request<Streaming<HandshakeRequest>>,
    ) -> Result<Response<Self::HandshakeStream>, Status> {
        let output = stream::once(async {
            Ok(HandshakeResponse {
                protocol_version: 1,
                payload: bytes::Bytes::from("flightserve-v1"),
            })
        });
        Ok(Response::new(Box::pin(output)))
    }

    /// List the single bound dataset. Criteria are accepted but never
    /// evaluated. Only the schema is resolved here; row-count fields are
    /// the unknown sentinel (-1).
    async fn list_flights(
        &self,
        _request: Request<Criteria>,
    ) -> Result<Response<Self::ListFlightsStream>, Status> {
        let metadata = storage::probe(&self.location, &self.credentials)
            .await
            .map_err(metadata_unavailable)?;

        let info = FlightInfo::new()
            .try_with_schema(&metadata.schema)
            .map_err(|e| Status::internal(e.to_string()))?
            .with_descriptor(self.descriptor())
            .with_endpoint(self.endpoint())
            .with_total_records(-1)
            .with_total_bytes(-1);

        let output = stream::iter(vec![Ok(info)]);
        Ok(Response::new(Box::pin(output)))
    }

    /// Resolve schema and row count from the file footer. `total_bytes`
    /// is set to the row count as well — an approximation, not a real
    /// byte figure.
    async fn get_flight_info(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        let descriptor = request.into_inner();
        let metadata = storage::probe(&self.location, &self.credentials)
            .await
            .map_err(metadata_unavailable)?;

        let info = FlightInfo::new()
            .try_with_schema(&metadata.schema)
            .map_err(|e| Status::internal(e.to_string()))?
            .with_descriptor(descriptor)
            .with_endpoint(self.endpoint())
            .with_total_records(metadata.num_rows)
            .with_total_bytes(metadata.num_rows);

        Ok(Response::new(info))
    }

    async fn poll_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<PollInfo>, Status> {
        Err(Status::unimplemented("poll_flight_info not implemented"))
    }

    async fn get_schema(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<SchemaResult>, Status> {
        let metadata = storage::probe(&self.location, &self.credentials)
            .await
            .map_err(metadata_unavailable)?;

        let options = IpcWriteOptions::default();
        let schema_result = SchemaAsIpc::new(&metadata.schema, &options)
            .try_into()
            .map_err(|e: arrow_schema::ArrowError| Status::internal(e.to_string()))?;

        Ok(Response::new(schema_result))
    }

    /// Stream the dataset named by the ticket as RecordBatches.
    ///
    /// The ticket is self-contained: its bytes are the dataset URI, so no
    /// state survives between `get_flight_info` and this call. Batches are
    /// read from storage one at a time as the transport drains them; a
    /// failure at any point aborts the stream with a generic unavailable
    /// status after logging the cause.
    async fn do_get(
        &self,
        request: Request<Ticket>,
    ) -> Result<Response<Self::DoGetStream>, Status> {
        let ticket = request.into_inner();
        let uri = std::str::from_utf8(&ticket.ticket)
            .map_err(|_| Status::invalid_argument("invalid UTF-8 in ticket"))?;
        let location = DatasetLocation::parse(uri)
            .map_err(|e| Status::invalid_argument(format!("invalid ticket: {e}")))?;

        let batches = BatchStream::open(&location, &self.credentials, self.batch_size)
            .await
            .map_err(|e| {
                error!(error = %e, uri, "failed to open dataset for streaming");
                Status::unavailable("failed to retrieve data")
            })?;
        let schema = batches.schema();

        let options = self
            .compression
            .ipc_write_options()
            .map_err(|e| Status::internal(e.to_string()))?;

        let output = FlightDataEncoderBuilder::new()
            .with_schema(schema)
            .with_options(options)
            .build(batches.map_err(|e| FlightError::ExternalError(Box::new(e))))
            .map_err(|e| {
                error!(error = %e, "batch stream aborted");
                Status::unavailable("failed to retrieve data")
            });

        Ok(Response::new(Box::pin(output)))
    }

    async fn do_put(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoPutStream>, Status> {
        Err(Status::unimplemented("dataset is read-only"))
    }

    async fn do_action(
        &self,
        _request: Request<Action>,
    ) -> Result<Response<Self::DoActionStream>, Status> {
        Err(Status::unimplemented("no actions available"))
    }

    async fn list_actions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ListActionsStream>, Status> {
        let output = stream::iter(Vec::<Result<ActionType, Status>>::new());
        Ok(Response::new(Box::pin(output)))
    }

    async fn do_exchange(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoExchangeStream>, Status> {
        Err(Status::unimplemented("do_exchange not implemented"))
    }
}

// =============================================================================
// SERVER SHELL
// =============================================================================

/// Bind the configured address and serve until the process stops.
///
/// Shutdown is the transport's default: stopping the accept loop lets
/// in-flight streams run to completion or abort naturally; there is no
/// forced cancellation.
pub async fn serve(config: ServerConfig) -> crate::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| {
            crate::Error::InvalidConfig(format!("invalid bind address: {}:{}", config.host, config.port))
        })?;
    let service = FlightServeService::new(&config)?;

    info!(
        location = config.advertised_location(),
        dataset = config.dataset_uri,
        batch_size = config.batch_size,
        "flight server listening"
    );

    Server::builder()
        .add_service(FlightServiceServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}
