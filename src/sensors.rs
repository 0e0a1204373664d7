//! Static descriptors for every sensor type served by the API.
//!
//! Each [`SensorSchema`] names the table a sensor writes to, the measurement
//! fields it carries and the rules applied to them. The CRUD engine in
//! `service`, `repository` and `routes` is driven entirely by these
//! descriptors, so adding a sensor means adding one entry to [`SENSORS`].

use serde::Serialize;

// ---

/// Storage and wire representation of a measurement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Stored as `TEXT`, reformatted to two decimals on read.
    Decimal,
    /// Stored as `INTEGER`, returned as a JSON integer.
    Integer,
}

/// One measurement field of a sensor reading.
#[derive(Debug, Serialize)]
pub struct FieldSpec {
    // ---
    /// JSON key used in request and response bodies.
    pub name: &'static str,

    /// Column name in the sensor table.
    pub column: &'static str,

    pub kind: FieldKind,

    /// Reject values that are not plain numbers (`[-+]?digits(.digits)?`).
    pub numeric: bool,
}

/// Describes one sensor vertical end to end.
#[derive(Debug, Serialize)]
pub struct SensorSchema {
    // ---
    /// Path segment under the API prefix, e.g. `bmp` in `/bmp/create`.
    pub name: &'static str,

    pub table: &'static str,

    pub fields: &'static [FieldSpec],

    /// Table has a `created_at` column and serves the latest-by-token route.
    pub tracks_created_at: bool,
}

impl SensorSchema {
    /// Comma separated list of measurement columns, in descriptor order.
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.column)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const fn decimal(name: &'static str, column: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        column,
        kind: FieldKind::Decimal,
        numeric: false,
    }
}

const fn numeric_decimal(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        column: name,
        kind: FieldKind::Decimal,
        numeric: true,
    }
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        column: name,
        kind: FieldKind::Integer,
        numeric: false,
    }
}

/// Beitian BN-220 GPS tracker.
pub static BEITIAN: SensorSchema = SensorSchema {
    name: "beitian",
    table: "db_sensor_beitian220",
    fields: &[
        numeric_decimal("latitude"),
        numeric_decimal("longitude"),
        numeric_decimal("battery"),
    ],
    tracks_created_at: true,
};

/// BMP180 barometric pressure / altitude.
pub static BMP: SensorSchema = SensorSchema {
    name: "bmp",
    table: "db_sensor_bmp180",
    fields: &[
        decimal("tekanan_udara", "tekanan_udara"),
        decimal("tinggi_permukaan", "tinggi_permukaan"),
        decimal("battery", "battery"),
    ],
    tracks_created_at: false,
};

/// INA219 current / voltage / power.
pub static INA: SensorSchema = SensorSchema {
    name: "ina",
    table: "db_sensor_ina219",
    fields: &[
        decimal("tegangan", "tegangan"),
        decimal("arus", "arus"),
        decimal("daya", "daya"),
    ],
    tracks_created_at: false,
};

/// PZEM power meter.
pub static PZEM: SensorSchema = SensorSchema {
    name: "pzem",
    table: "db_sensor_pzem",
    fields: &[
        decimal("tegangan", "tegangan"),
        decimal("arus", "arus"),
        decimal("daya", "daya"),
    ],
    tracks_created_at: false,
};

/// TTGO T-Higrow soil and climate probe.
pub static THIGROW: SensorSchema = SensorSchema {
    name: "thigrow",
    table: "db_sensor_thigrow",
    fields: &[
        integer("kelembaban_tanah_th"),
        integer("kelembaban_tanah_sm"),
        integer("kelembaban_udara"),
        decimal("intensitas_cahaya", "i_cahaya"),
        decimal("battery", "battery"),
        decimal("temperature", "temperature"),
        decimal("kadar_garam", "kadar_garam"),
    ],
    tracks_created_at: false,
};

/// THM30D temperature / humidity.
pub static THM: SensorSchema = SensorSchema {
    name: "thm",
    table: "db_sensor_thm30d",
    fields: &[
        decimal("temperature", "temperature"),
        decimal("kelembaban_udara", "kelembaban_udara"),
        decimal("battery", "battery"),
    ],
    tracks_created_at: false,
};

/// Every registered sensor, in route registration order.
pub static SENSORS: [&SensorSchema; 6] = [&BEITIAN, &BMP, &INA, &PZEM, &THIGROW, &THM];

/// Look up a sensor descriptor by its path name.
pub fn find(name: &str) -> Option<&'static SensorSchema> {
    SENSORS.iter().copied().find(|s| s.name == name)
}
