use crate::{
    client::{ExecutionClient, OrderUpdate},
    order::{
        Order,
        id::ClientOrderId,
        request::{CancelOrderRequest, OrderFilter, PlaceOrderRequest, PlaceOrderResponse, RejectReason},
        state::OrderStatus,
    },
    registry::OrderRegistry,
    risk_gate::{RiskDecision, RiskGate},
    trade::Fill,
};
use chrono::Utc;
use fnv::FnvHashMap;
use meridian_instrument::{Symbol, SymbolMeta};
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, time::timeout};
use tracing::{info, warn};

const FILL_EVENT_CHANNEL_CAPACITY: usize = 1_024;
const ORDER_EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// Default deadline for the synchronous Risk Manager call (§4.6: "deadline-bounded, e.g. 10ms p99").
pub const DEFAULT_RISK_TIMEOUT: Duration = Duration::from_millis(10);

/// Default deadline for the exchange submit round-trip (§4.3: "retry ... within a deadline, e.g. 2s").
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(2);

/// An order state change or fill emitted on [`ExecutionEngine::subscribe_order_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Updated(Order),
    Filled(Fill),
}

/// Authoritative owner of order lifecycle (§4.3). Generic over the [`ExecutionClient`] (selects
/// Live/Simulation/Observation per §4.3's execution modes — one `ExecutionEngine` is constructed
/// per mode) and [`RiskGate`] (the synchronous pre-trade check collaborator, §4.6).
pub struct ExecutionEngine<Client, Risk> {
    client: Client,
    risk: Risk,
    registry: OrderRegistry,
    symbols: Arc<FnvHashMap<Symbol, SymbolMeta>>,
    fills_tx: broadcast::Sender<Fill>,
    order_events_tx: broadcast::Sender<OrderEvent>,
    risk_timeout: Duration,
    submit_timeout: Duration,
}

impl<Client, Risk> ExecutionEngine<Client, Risk>
where
    Client: ExecutionClient,
    Risk: RiskGate,
{
    pub fn new(client: Client, risk: Risk, symbols: Arc<FnvHashMap<Symbol, SymbolMeta>>) -> Self {
        Self {
            client,
            risk,
            registry: OrderRegistry::new(),
            symbols,
            fills_tx: broadcast::channel(FILL_EVENT_CHANNEL_CAPACITY).0,
            order_events_tx: broadcast::channel(ORDER_EVENT_CHANNEL_CAPACITY).0,
            risk_timeout: DEFAULT_RISK_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, risk_timeout: Duration, submit_timeout: Duration) -> Self {
        self.risk_timeout = risk_timeout;
        self.submit_timeout = submit_timeout;
        self
    }

    pub fn subscribe_fills(&self) -> broadcast::Receiver<Fill> {
        self.fills_tx.subscribe()
    }

    pub fn subscribe_order_events(&self) -> broadcast::Receiver<OrderEvent> {
        self.order_events_tx.subscribe()
    }

    pub fn get_orders(&self, filter: &OrderFilter) -> Vec<Order> {
        self.registry
            .all()
            .into_iter()
            .filter(|order| {
                filter
                    .symbol
                    .as_ref()
                    .is_none_or(|symbol| &order.symbol == symbol)
            })
            .filter(|order| !filter.open_only || !order.is_terminal())
            .collect()
    }

    /// Validate (§4.3 rules 1-5, short-circuiting), submit, and register a [`PlaceOrderRequest`].
    pub async fn place_order(&self, request: PlaceOrderRequest) -> PlaceOrderResponse {
        let client_order_id = request
            .client_order_id
            .clone()
            .unwrap_or_else(ClientOrderId::random);

        if let Some(reason) = self.validate_syntax(&request) {
            return PlaceOrderResponse::Rejected {
                client_order_id,
                reason,
            };
        }

        if let Some(existing) = self.registry.get(&client_order_id) {
            return PlaceOrderResponse::Accepted(existing);
        }

        match timeout(self.risk_timeout, self.risk.check_order(&request)).await {
            Err(_elapsed) => {
                return PlaceOrderResponse::Rejected {
                    client_order_id,
                    reason: RejectReason::RiskTimeout,
                };
            }
            Ok(RiskDecision::Deny { reason, .. }) => {
                return PlaceOrderResponse::Rejected {
                    client_order_id,
                    reason: RejectReason::RiskDenied(reason),
                };
            }
            Ok(RiskDecision::Allow { .. }) => {}
        }

        if !self.client.rate_limiter().try_acquire().await {
            return PlaceOrderResponse::Rejected {
                client_order_id,
                reason: RejectReason::RateLimited,
            };
        }

        if !self.client.circuit_breaker().try_acquire().await {
            return PlaceOrderResponse::Rejected {
                client_order_id,
                reason: RejectReason::CircuitOpen,
            };
        }

        self.submit(request, client_order_id).await
    }

    fn validate_syntax(&self, request: &PlaceOrderRequest) -> Option<RejectReason> {
        let Some(meta) = self.symbols.get(&request.symbol) else {
            return Some(RejectReason::UnknownSymbol(request.symbol.to_string()));
        };

        if request.quantity <= Decimal::ZERO {
            return Some(RejectReason::NonPositiveQuantity);
        }
        if !meta.quantity_precision_ok(request.quantity) {
            return Some(RejectReason::QuantityPrecision);
        }

        match (request.kind.requires_price(), request.price) {
            (true, None) => {
                return Some(RejectReason::MissingPrice(request.kind.to_string()));
            }
            (_, Some(price)) => {
                if !meta.price_precision_ok(price) || !meta.tick_aligned(price) {
                    return Some(RejectReason::PricePrecision);
                }
                if !meta.notional_ok(price, request.quantity) {
                    return Some(RejectReason::NotionalTooSmall);
                }
            }
            (false, None) => {}
        }

        None
    }

    async fn submit(
        &self,
        request: PlaceOrderRequest,
        client_order_id: ClientOrderId,
    ) -> PlaceOrderResponse {
        let now = Utc::now();
        let mut order = Order::new(
            client_order_id.clone(),
            None,
            request.symbol.clone(),
            request.side,
            request.kind,
            request.time_in_force,
            request.price,
            request.quantity,
            OrderStatus::New,
            Decimal::ZERO,
            None,
            now,
            now,
            Client::MODE,
        );
        self.registry.insert(order.clone());

        order.status = OrderStatus::PendingSubmit;
        order.updated_ts = Utc::now();
        self.registry.update(order.clone());

        let outcome = timeout(
            self.submit_timeout,
            self.client.submit_order(&request, &client_order_id),
        )
        .await;

        let ack = match outcome {
            Ok(Ok(ack)) => ack,
            Ok(Err(error)) if request.allow_post_only_retry && request.time_in_force.post_only() && is_would_cross(&error) => {
                info!(%client_order_id, "post-only order would cross, retrying without post-only");
                let mut retry = request.clone();
                retry.time_in_force = crate::order::TimeInForce::GoodTilCancelled(false);
                match self.client.best_price(&request.symbol, request.side) {
                    Some(price) => retry.price = Some(price),
                    None => warn!(%client_order_id, "no fresh best price available, retrying at the stale request price"),
                }
                match timeout(
                    self.submit_timeout,
                    self.client.submit_order(&retry, &client_order_id),
                )
                .await
                {
                    Ok(Ok(ack)) => ack,
                    _ => {
                        return self
                            .reject_terminal(order, client_order_id, RejectReason::ExchangeRejected(error.to_string()))
                            .await;
                    }
                }
            }
            Ok(Err(error)) => {
                return self
                    .reject_terminal(order, client_order_id, RejectReason::ExchangeRejected(error.to_string()))
                    .await;
            }
            Err(_elapsed) => {
                return self
                    .reject_terminal(order, client_order_id, RejectReason::SubmitTimeout)
                    .await;
            }
        };

        order.exchange_order_id = Some(ack.exchange_order_id);
        order.status = match Client::MODE {
            crate::order::ExecutionMode::Observation => OrderStatus::New,
            _ => OrderStatus::Submitted,
        };
        order.updated_ts = ack.time_exchange;
        self.registry.update(order.clone());
        let _ = self.order_events_tx.send(OrderEvent::Updated(order.clone()));

        if let Some(update) = self.client.synthesize_fill(&order).await {
            self.apply_order_update(update);
            order = self.registry.get(&order.client_order_id).unwrap_or(order);
        }

        PlaceOrderResponse::Accepted(order)
    }

    async fn reject_terminal(
        &self,
        mut order: Order,
        client_order_id: ClientOrderId,
        reason: RejectReason,
    ) -> PlaceOrderResponse {
        order.status = OrderStatus::Rejected;
        order.updated_ts = Utc::now();
        self.registry.update(order.clone());
        let _ = self.order_events_tx.send(OrderEvent::Updated(order));
        PlaceOrderResponse::Rejected {
            client_order_id,
            reason,
        }
    }

    /// Idempotent: cancelling a terminal order returns its current state rather than an error
    /// (§4.3).
    pub async fn cancel_order(&self, request: CancelOrderRequest) -> Result<Order, crate::error::ExecutionError> {
        let Some(existing) = self.registry.get(&request.client_order_id) else {
            return Err(crate::error::ExecutionError::NotFound);
        };

        if existing.is_terminal() {
            return Ok(existing);
        }

        self.client.cancel_order(&existing).await?;

        let mut cancelled = existing;
        cancelled.status = OrderStatus::Canceled;
        cancelled.updated_ts = Utc::now();
        self.registry.update(cancelled.clone());
        let _ = self.order_events_tx.send(OrderEvent::Updated(cancelled.clone()));
        Ok(cancelled)
    }

    /// Apply a user-data-stream [`OrderUpdate`] idempotently (§4.3/§5): duplicates (no new fill,
    /// same status) are a no-op; every positive delta in cumulative filled quantity emits exactly
    /// one [`Fill`].
    pub fn apply_order_update(&self, update: OrderUpdate) {
        let Some(mut order) = self.registry.get(&update.client_order_id) else {
            warn!(client_order_id = %update.client_order_id, "order update for unknown client_order_id");
            return;
        };

        if order.is_terminal() {
            return;
        }

        if !order.status.can_transition_to(update.status) {
            warn!(client_order_id = %update.client_order_id, from = ?order.status, to = ?update.status, "rejecting illegal order state transition");
            return;
        }

        let delta = update.cumulative_filled_quantity - order.filled_quantity;
        if delta > Decimal::ZERO {
            let fill = Fill::new(
                crate::order::id::FillId::new(format!(
                    "{}-{}",
                    update.exchange_order_id, update.cumulative_filled_quantity
                )),
                order.client_order_id.clone(),
                update.exchange_order_id.clone(),
                order.symbol.clone(),
                update.last_fill_price.or(update.avg_fill_price).unwrap_or_default(),
                update.last_fill_quantity.max(delta),
                update.fee,
                update.fee_asset.clone(),
                update.is_maker,
                update.time_exchange,
            );
            let _ = self.fills_tx.send(fill.clone());
            let _ = self.order_events_tx.send(OrderEvent::Filled(fill));
        }

        order.exchange_order_id = Some(update.exchange_order_id);
        order.filled_quantity = update.cumulative_filled_quantity;
        order.avg_fill_price = update.avg_fill_price.or(order.avg_fill_price);
        order.status = update.status;
        order.updated_ts = update.time_exchange;
        self.registry.update(order.clone());
        let _ = self.order_events_tx.send(OrderEvent::Updated(order));
    }
}

fn is_would_cross(error: &crate::error::ExecutionError) -> bool {
    matches!(error, crate::error::ExecutionError::Rejected(msg) if msg.contains("-2021") || msg.to_lowercase().contains("would immediately match"))
}
