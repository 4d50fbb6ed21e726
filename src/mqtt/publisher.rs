use crate::config::MqttConfig;
use crate::errors::{MqttError, SinkError};
use crate::live::aggregator::{LiveTotals, RollingWindow};
use crate::live::marker::MarkerKind;
use crate::live::summary::FleetSummary;
use crate::mqtt::context::{MqttTransport, PublishContext};
use crate::render::LiveSink;
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;

/// Topic below the root that carries the fleet summary
pub const FLEET_TOPIC: &str = "fleet";

/// Requests buffered for the event loop before publishes start failing
const REQUEST_QUEUE_CAPACITY: usize = 64;

pub struct MqttPublisher {
    transport: Box<dyn MqttTransport>,
    root_topic: String,
    connected: watch::Receiver<bool>,
}

macro_rules! publish_if_changed {
    ($context:expr, $src:ident , $old:ident, $field:ident) => {
        if $old.map_or(true, |o| o.$field != $src.$field) {
            $context.publish(stringify!($field), &$src.$field)?;
        }
    };
}

impl MqttPublisher {
    pub fn new(config: &MqttConfig) -> Result<Self, MqttError> {
        let client_id = format!("city-energy-live-{}", std::process::id());

        let mut mqtt_options = if let Some(socket_path) = &config.socket {
            // Unix domain socket connection
            tracing::info!("Using MQTT Unix socket: {}", socket_path);
            MqttOptions::new(client_id, socket_path, 0)
        } else {
            let host = config.host.as_ref().ok_or_else(|| {
                MqttError::ClientError("MQTT host or socket must be configured".to_string())
            })?;

            tracing::info!("Using MQTT TCP connection: {}:{}", host, config.port);
            MqttOptions::new(client_id, host, config.port)
        };

        if !config.username.is_empty() {
            mqtt_options.set_credentials(&config.username, &config.password);
        }

        mqtt_options.set_keep_alive(Duration::from_secs(60));

        // Dashboards see "false" on the online topic if the bridge disappears
        let online_topic = format!("{}/online", config.root);
        mqtt_options.set_last_will(rumqttc::LastWill {
            topic: online_topic,
            message: b"false".to_vec().into(),
            qos: QoS::AtLeastOnce,
            retain: true,
        });

        let (client, mut connection) = Client::new(mqtt_options, REQUEST_QUEUE_CAPACITY);
        let (connected_tx, connected) = watch::channel(false);

        // The blocking event loop lives on its own thread, off the runtime
        thread::spawn(move || {
            for notification in connection.iter() {
                match notification {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("MQTT connected");
                        connected_tx.send_replace(true);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // rumqttc reconnects on the next iteration
                        tracing::error!("MQTT connection error: {:?}", e);
                        connected_tx.send_replace(false);
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        });

        Ok(Self {
            transport: Box::new(client),
            root_topic: config.root.clone(),
            connected,
        })
    }

    /// Publisher over an arbitrary transport, treated as always connected
    pub fn with_transport(root: impl Into<String>, transport: impl MqttTransport + 'static) -> Self {
        let (_, connected) = watch::channel(true);
        Self {
            transport: Box::new(transport),
            root_topic: root.into(),
            connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Wait until the broker acknowledged the connection.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let mut connected = self.connected.clone();
        let acked = tokio::time::timeout(timeout, async move {
            connected.wait_for(|up| *up).await.is_ok()
        })
        .await;
        matches!(acked, Ok(true))
    }

    pub fn context(&'_ self, topic: &str) -> PublishContext<'_> {
        let full_topic = if topic.is_empty() {
            self.root_topic.clone()
        } else {
            format!("{}/{}", self.root_topic, topic)
        };
        PublishContext::new(self.transport.as_ref(), full_topic)
    }

    pub fn publish_online_status(&self, online: bool) -> Result<(), MqttError> {
        let context = self.context("");
        context.publish("online", &online)
    }

    /// Publish the current totals of a view
    /// Only publishes fields that have changed compared to old
    pub fn publish_totals(
        &self,
        view: &str,
        totals: &LiveTotals,
        old: Option<&LiveTotals>,
    ) -> Result<(), MqttError> {
        let context = self.context(view).child("totals");
        publish_if_changed!(context, totals, old, total_kwh);
        publish_if_changed!(context, totals, old, solar_kwh);
        publish_if_changed!(context, totals, old, grid_kwh);
        publish_if_changed!(context, totals, old, active_count);
        publish_if_changed!(context, totals, old, avg_voltage);

        Ok(())
    }

    /// Publish the whole window as a JSON array, oldest point first
    pub fn publish_window(&self, view: &str, window: &RollingWindow) -> Result<(), MqttError> {
        let context = self.context(view);
        context.publish_json("window", window.points())?;
        if let Some(last) = window.last() {
            context.publish("updated_at", &last.timestamp)?;
            context.publish("time", &last.time)?;
        }
        Ok(())
    }

    pub fn publish_fleet(
        &self,
        fleet: &FleetSummary,
        old: Option<&FleetSummary>,
    ) -> Result<(), MqttError> {
        let context = self.context(FLEET_TOPIC);
        publish_if_changed!(context, fleet, old, total_sensors);
        publish_if_changed!(context, fleet, old, active_sensors);
        publish_if_changed!(context, fleet, old, solar_sensors);
        publish_if_changed!(context, fleet, old, grid_sensors);

        let markers = context.child("markers");
        for kind in MarkerKind::ALL {
            let count = fleet.legend.count(kind);
            if old.map_or(true, |o| o.legend.count(kind) != count) {
                markers.publish(kind.as_str(), &count)?;
            }
        }

        if old.map_or(true, |o| o.ranking != fleet.ranking) {
            context.publish_json("districts", &fleet.ranking)?;
        }
        if old.map_or(true, |o| o.district != fleet.district) {
            context.publish_json("district", &fleet.district)?;
        }
        if old.map_or(true, |o| o.sensor != fleet.sensor) {
            context.publish_json("sensor", &fleet.sensor)?;
        }

        Ok(())
    }
}

impl LiveSink for MqttPublisher {
    fn window_updated(
        &self,
        view: &str,
        window: &RollingWindow,
        totals: &LiveTotals,
        old: Option<&LiveTotals>,
    ) -> Result<(), SinkError> {
        self.publish_totals(view, totals, old)?;
        self.publish_window(view, window)?;
        Ok(())
    }

    fn totals_updated(
        &self,
        view: &str,
        totals: &LiveTotals,
        old: Option<&LiveTotals>,
    ) -> Result<(), SinkError> {
        self.publish_totals(view, totals, old)?;
        Ok(())
    }

    fn fleet_updated(
        &self,
        fleet: &FleetSummary,
        old: Option<&FleetSummary>,
    ) -> Result<(), SinkError> {
        self.publish_fleet(fleet, old)?;
        Ok(())
    }
}
