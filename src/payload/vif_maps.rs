//! VIF/VIFE Mapping Tables and Lookup Functions
//!
//! This module provides lookups for M-Bus Value Information Fields (VIF)
//! and Value Information Field Extensions (VIFE) as defined in EN 13757-3.
//!
//! Each table row covers a contiguous code range sharing one quantity and unit.
//! The low bits of the code inside the range select the decimal exponent
//! (`Scale::Decimal`) or the time unit (`Scale::Duration`).

use serde::Serialize;
use std::fmt;

/// Physical quantity (or descriptive meaning) of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quantity {
    Energy,
    Volume,
    Mass,
    OnTime,
    OperatingTime,
    Power,
    VolumeFlow,
    MassFlow,
    FlowTemperature,
    ReturnTemperature,
    TemperatureDifference,
    ExternalTemperature,
    Pressure,
    Date,
    DateTime,
    HcaUnits,
    AveragingDuration,
    ActualityDuration,
    FabricationNumber,
    Identification,
    BusAddress,
    PlainText,
    AnyVif,
    ManufacturerSpecific,
    Credit,
    Debit,
    AccessNumber,
    Medium,
    Manufacturer,
    ParameterSet,
    ModelVersion,
    HardwareVersion,
    FirmwareVersion,
    SoftwareVersion,
    CustomerLocation,
    Customer,
    AccessCodeUser,
    AccessCodeOperator,
    AccessCodeSystemOperator,
    AccessCodeDeveloper,
    Password,
    ErrorFlags,
    ErrorMask,
    DigitalOutput,
    DigitalInput,
    BaudRate,
    ResponseDelayTime,
    Retry,
    FirstStorageNumber,
    LastStorageNumber,
    StorageBlockSize,
    StorageInterval,
    OperatorSpecificData,
    TimePointSecond,
    DurationSinceLastReadout,
    TariffStart,
    TariffDuration,
    TariffPeriod,
    Dimensionless,
    Voltage,
    Current,
    ResetCounter,
    CumulationCounter,
    ControlSignal,
    DayOfWeek,
    WeekNumber,
    DayChangeTime,
    ParameterActivationState,
    SupplierInformation,
    DurationSinceLastCumulation,
    BatteryOperatingTime,
    BatteryChangeDateTime,
    TemperatureLimit,
    CumulativeMaxPower,
    Reserved,
}

impl Quantity {
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Energy => "Energy",
            Quantity::Volume => "Volume",
            Quantity::Mass => "Mass",
            Quantity::OnTime => "On time",
            Quantity::OperatingTime => "Operating time",
            Quantity::Power => "Power",
            Quantity::VolumeFlow => "Volume flow",
            Quantity::MassFlow => "Mass flow",
            Quantity::FlowTemperature => "Flow temperature",
            Quantity::ReturnTemperature => "Return temperature",
            Quantity::TemperatureDifference => "Temperature difference",
            Quantity::ExternalTemperature => "External temperature",
            Quantity::Pressure => "Pressure",
            Quantity::Date => "Time point (date)",
            Quantity::DateTime => "Time point (date & time)",
            Quantity::HcaUnits => "Units for H.C.A.",
            Quantity::AveragingDuration => "Averaging duration",
            Quantity::ActualityDuration => "Actuality duration",
            Quantity::FabricationNumber => "Fabrication number",
            Quantity::Identification => "(Enhanced) identification",
            Quantity::BusAddress => "Bus address",
            Quantity::PlainText => "Plain text unit",
            Quantity::AnyVif => "Any VIF",
            Quantity::ManufacturerSpecific => "Manufacturer specific",
            Quantity::Credit => "Credit",
            Quantity::Debit => "Debit",
            Quantity::AccessNumber => "Access number",
            Quantity::Medium => "Medium",
            Quantity::Manufacturer => "Manufacturer",
            Quantity::ParameterSet => "Parameter set identification",
            Quantity::ModelVersion => "Model / version",
            Quantity::HardwareVersion => "Hardware version",
            Quantity::FirmwareVersion => "Firmware version",
            Quantity::SoftwareVersion => "Software version",
            Quantity::CustomerLocation => "Customer location",
            Quantity::Customer => "Customer",
            Quantity::AccessCodeUser => "Access code user",
            Quantity::AccessCodeOperator => "Access code operator",
            Quantity::AccessCodeSystemOperator => "Access code system operator",
            Quantity::AccessCodeDeveloper => "Access code developer",
            Quantity::Password => "Password",
            Quantity::ErrorFlags => "Error flags",
            Quantity::ErrorMask => "Error mask",
            Quantity::DigitalOutput => "Digital output",
            Quantity::DigitalInput => "Digital input",
            Quantity::BaudRate => "Baud rate",
            Quantity::ResponseDelayTime => "Response delay time",
            Quantity::Retry => "Retry",
            Quantity::FirstStorageNumber => "First storage number (cyclic)",
            Quantity::LastStorageNumber => "Last storage number (cyclic)",
            Quantity::StorageBlockSize => "Size of storage block",
            Quantity::StorageInterval => "Storage interval",
            Quantity::OperatorSpecificData => "Operator specific data",
            Quantity::TimePointSecond => "Time point second",
            Quantity::DurationSinceLastReadout => "Duration since last readout",
            Quantity::TariffStart => "Start of tariff",
            Quantity::TariffDuration => "Duration of tariff",
            Quantity::TariffPeriod => "Period of tariff",
            Quantity::Dimensionless => "Dimensionless",
            Quantity::Voltage => "Voltage",
            Quantity::Current => "Current",
            Quantity::ResetCounter => "Reset counter",
            Quantity::CumulationCounter => "Cumulation counter",
            Quantity::ControlSignal => "Control signal",
            Quantity::DayOfWeek => "Day of week",
            Quantity::WeekNumber => "Week number",
            Quantity::DayChangeTime => "Time point of day change",
            Quantity::ParameterActivationState => "State of parameter activation",
            Quantity::SupplierInformation => "Special supplier information",
            Quantity::DurationSinceLastCumulation => "Duration since last cumulation",
            Quantity::BatteryOperatingTime => "Operating time battery",
            Quantity::BatteryChangeDateTime => "Date and time of battery change",
            Quantity::TemperatureLimit => "Cold/warm temperature limit",
            Quantity::CumulativeMaxPower => "Cumulative count max power",
            Quantity::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base unit a record value is expressed in, before the decimal exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    None,
    WattHour,
    Joule,
    CubicMetre,
    Kilogram,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
    Watt,
    JoulePerHour,
    CubicMetrePerHour,
    CubicMetrePerMinute,
    CubicMetrePerSecond,
    KilogramPerHour,
    Celsius,
    Kelvin,
    Fahrenheit,
    Bar,
    Volt,
    Ampere,
    BitPerSecond,
    BitTime,
    Currency,
    CubicFeet,
    UsGallon,
    UsGallonPerMinute,
    UsGallonPerHour,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::WattHour => "Wh",
            Unit::Joule => "J",
            Unit::CubicMetre => "m³",
            Unit::Kilogram => "kg",
            Unit::Second => "s",
            Unit::Minute => "min",
            Unit::Hour => "h",
            Unit::Day => "d",
            Unit::Month => "month",
            Unit::Year => "year",
            Unit::Watt => "W",
            Unit::JoulePerHour => "J/h",
            Unit::CubicMetrePerHour => "m³/h",
            Unit::CubicMetrePerMinute => "m³/min",
            Unit::CubicMetrePerSecond => "m³/s",
            Unit::KilogramPerHour => "kg/h",
            Unit::Celsius => "°C",
            Unit::Kelvin => "K",
            Unit::Fahrenheit => "°F",
            Unit::Bar => "bar",
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::BitPerSecond => "bit/s",
            Unit::BitTime => "bit times",
            Unit::Currency => "currency units",
            Unit::CubicFeet => "ft³",
            Unit::UsGallon => "US gal",
            Unit::UsGallonPerMinute => "US gal/min",
            Unit::UsGallonPerHour => "US gal/h",
        }
    }

    fn takes_si_prefix(&self) -> bool {
        matches!(
            self,
            Unit::WattHour
                | Unit::Joule
                | Unit::Watt
                | Unit::JoulePerHour
                | Unit::Bar
                | Unit::Volt
                | Unit::Ampere
                | Unit::Second
        )
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Human-readable label for a unit scaled by `10^exponent`.
///
/// ```rust
/// use mbus_telegram::payload::vif_maps::{unit_label, Unit};
///
/// assert_eq!(unit_label(Unit::CubicMetre, -3), "litre");
/// assert_eq!(unit_label(Unit::WattHour, 3), "kWh");
/// assert_eq!(unit_label(Unit::Celsius, -1), "10^-1 °C");
/// ```
pub fn unit_label(unit: Unit, exponent: i8) -> String {
    let special = match (unit, exponent) {
        (_, 0) => Some(unit.symbol()),
        (Unit::CubicMetre, -3) => Some("litre"),
        (Unit::CubicMetre, -6) => Some("ml"),
        (Unit::CubicMetrePerHour, -3) => Some("l/h"),
        (Unit::CubicMetrePerMinute, -3) => Some("l/min"),
        (Unit::CubicMetrePerSecond, -3) => Some("l/s"),
        (Unit::Kilogram, -3) => Some("g"),
        (Unit::Kilogram, 3) => Some("t"),
        (Unit::KilogramPerHour, -3) => Some("g/h"),
        (Unit::KilogramPerHour, 3) => Some("t/h"),
        _ => None,
    };
    if let Some(label) = special {
        return label.to_string();
    }

    if unit.takes_si_prefix() {
        let prefix = match exponent {
            -12 => Some("p"),
            -9 => Some("n"),
            -6 => Some("µ"),
            -3 => Some("m"),
            3 => Some("k"),
            6 => Some("M"),
            9 => Some("G"),
            _ => None,
        };
        if let Some(prefix) = prefix {
            return format!("{prefix}{}", unit.symbol());
        }
    }

    match unit {
        Unit::None => format!("10^{exponent}"),
        _ => format!("10^{exponent} {}", unit.symbol()),
    }
}

/// How the code bits inside a table range translate into scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Exponent is `base + (code - first)`.
    Decimal(i8),
    /// Exponent is fixed.
    Fixed(i8),
    /// Low two bits select seconds, minutes, hours or days.
    Duration,
    /// Low two bits select hours, days, months or years.
    LongDuration,
}

/// Hint for interpreting the raw value bytes of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodeHint {
    Numeric,
    /// Type G date for 2-byte integer fields.
    Date,
    /// Type F or I date-time for 4- or 6-byte integer fields (type G for 2 bytes).
    DateTime,
}

/// One row of a VIF table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VifEntry {
    pub first: u8,
    pub last: u8,
    pub quantity: Quantity,
    pub unit: Unit,
    pub scale: Scale,
    pub hint: DecodeHint,
}

const fn vif(first: u8, last: u8, quantity: Quantity, unit: Unit, scale: Scale) -> VifEntry {
    VifEntry {
        first,
        last,
        quantity,
        unit,
        scale,
        hint: DecodeHint::Numeric,
    }
}

const fn time_point(code: u8, quantity: Quantity, hint: DecodeHint) -> VifEntry {
    VifEntry {
        first: code,
        last: code,
        quantity,
        unit: Unit::None,
        scale: Scale::Fixed(0),
        hint,
    }
}

const fn plain(code: u8, quantity: Quantity) -> VifEntry {
    vif(code, code, quantity, Unit::None, Scale::Fixed(0))
}

/// Resolved meaning of one VIF table code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VifInfo {
    pub quantity: Quantity,
    pub unit: Unit,
    pub exponent: i8,
    pub hint: DecodeHint,
}

impl VifEntry {
    fn resolve(&self, code: u8) -> VifInfo {
        let offset = code.saturating_sub(self.first);
        let (unit, exponent) = match self.scale {
            Scale::Decimal(base) => (self.unit, base + offset as i8),
            Scale::Fixed(exponent) => (self.unit, exponent),
            Scale::Duration => (
                [Unit::Second, Unit::Minute, Unit::Hour, Unit::Day][usize::from(code & 0x03)],
                0,
            ),
            Scale::LongDuration => (
                [Unit::Hour, Unit::Day, Unit::Month, Unit::Year][usize::from(code & 0x03)],
                0,
            ),
        };
        VifInfo {
            quantity: self.quantity,
            unit,
            exponent,
            hint: self.hint,
        }
    }
}

/// Primary VIF codes (extension bit cleared), EN 13757-3 table 10.
/// 0x7B to 0x7F are structural and handled by the VIB parser.
pub const PRIMARY_VIF_TABLE: &[VifEntry] = &[
    vif(0x00, 0x07, Quantity::Energy, Unit::WattHour, Scale::Decimal(-3)),
    vif(0x08, 0x0F, Quantity::Energy, Unit::Joule, Scale::Decimal(0)),
    vif(0x10, 0x17, Quantity::Volume, Unit::CubicMetre, Scale::Decimal(-6)),
    vif(0x18, 0x1F, Quantity::Mass, Unit::Kilogram, Scale::Decimal(-3)),
    vif(0x20, 0x23, Quantity::OnTime, Unit::Second, Scale::Duration),
    vif(0x24, 0x27, Quantity::OperatingTime, Unit::Second, Scale::Duration),
    vif(0x28, 0x2F, Quantity::Power, Unit::Watt, Scale::Decimal(-3)),
    vif(0x30, 0x37, Quantity::Power, Unit::JoulePerHour, Scale::Decimal(0)),
    vif(0x38, 0x3F, Quantity::VolumeFlow, Unit::CubicMetrePerHour, Scale::Decimal(-6)),
    vif(0x40, 0x47, Quantity::VolumeFlow, Unit::CubicMetrePerMinute, Scale::Decimal(-7)),
    vif(0x48, 0x4F, Quantity::VolumeFlow, Unit::CubicMetrePerSecond, Scale::Decimal(-9)),
    vif(0x50, 0x57, Quantity::MassFlow, Unit::KilogramPerHour, Scale::Decimal(-3)),
    vif(0x58, 0x5B, Quantity::FlowTemperature, Unit::Celsius, Scale::Decimal(-3)),
    vif(0x5C, 0x5F, Quantity::ReturnTemperature, Unit::Celsius, Scale::Decimal(-3)),
    vif(0x60, 0x63, Quantity::TemperatureDifference, Unit::Kelvin, Scale::Decimal(-3)),
    vif(0x64, 0x67, Quantity::ExternalTemperature, Unit::Celsius, Scale::Decimal(-3)),
    vif(0x68, 0x6B, Quantity::Pressure, Unit::Bar, Scale::Decimal(-3)),
    time_point(0x6C, Quantity::Date, DecodeHint::Date),
    time_point(0x6D, Quantity::DateTime, DecodeHint::DateTime),
    plain(0x6E, Quantity::HcaUnits),
    plain(0x6F, Quantity::Reserved),
    vif(0x70, 0x73, Quantity::AveragingDuration, Unit::Second, Scale::Duration),
    vif(0x74, 0x77, Quantity::ActualityDuration, Unit::Second, Scale::Duration),
    plain(0x78, Quantity::FabricationNumber),
    plain(0x79, Quantity::Identification),
    plain(0x7A, Quantity::BusAddress),
];

/// Codes following VIF 0xFD, EN 13757-3 table 12.
pub const VIFE_FD_TABLE: &[VifEntry] = &[
    vif(0x00, 0x03, Quantity::Credit, Unit::Currency, Scale::Decimal(-3)),
    vif(0x04, 0x07, Quantity::Debit, Unit::Currency, Scale::Decimal(-3)),
    plain(0x08, Quantity::AccessNumber),
    plain(0x09, Quantity::Medium),
    plain(0x0A, Quantity::Manufacturer),
    plain(0x0B, Quantity::ParameterSet),
    plain(0x0C, Quantity::ModelVersion),
    plain(0x0D, Quantity::HardwareVersion),
    plain(0x0E, Quantity::FirmwareVersion),
    plain(0x0F, Quantity::SoftwareVersion),
    plain(0x10, Quantity::CustomerLocation),
    plain(0x11, Quantity::Customer),
    plain(0x12, Quantity::AccessCodeUser),
    plain(0x13, Quantity::AccessCodeOperator),
    plain(0x14, Quantity::AccessCodeSystemOperator),
    plain(0x15, Quantity::AccessCodeDeveloper),
    plain(0x16, Quantity::Password),
    plain(0x17, Quantity::ErrorFlags),
    plain(0x18, Quantity::ErrorMask),
    plain(0x1A, Quantity::DigitalOutput),
    plain(0x1B, Quantity::DigitalInput),
    vif(0x1C, 0x1C, Quantity::BaudRate, Unit::BitPerSecond, Scale::Fixed(0)),
    vif(0x1D, 0x1D, Quantity::ResponseDelayTime, Unit::BitTime, Scale::Fixed(0)),
    plain(0x1E, Quantity::Retry),
    plain(0x20, Quantity::FirstStorageNumber),
    plain(0x21, Quantity::LastStorageNumber),
    plain(0x22, Quantity::StorageBlockSize),
    vif(0x24, 0x27, Quantity::StorageInterval, Unit::Second, Scale::Duration),
    vif(0x28, 0x28, Quantity::StorageInterval, Unit::Month, Scale::Fixed(0)),
    vif(0x29, 0x29, Quantity::StorageInterval, Unit::Year, Scale::Fixed(0)),
    plain(0x2A, Quantity::OperatorSpecificData),
    vif(0x2B, 0x2B, Quantity::TimePointSecond, Unit::Second, Scale::Fixed(0)),
    vif(0x2C, 0x2F, Quantity::DurationSinceLastReadout, Unit::Second, Scale::Duration),
    time_point(0x30, Quantity::TariffStart, DecodeHint::DateTime),
    vif(0x31, 0x33, Quantity::TariffDuration, Unit::Second, Scale::Duration),
    vif(0x34, 0x37, Quantity::TariffPeriod, Unit::Second, Scale::Duration),
    vif(0x38, 0x38, Quantity::TariffPeriod, Unit::Month, Scale::Fixed(0)),
    vif(0x39, 0x39, Quantity::TariffPeriod, Unit::Year, Scale::Fixed(0)),
    plain(0x3A, Quantity::Dimensionless),
    vif(0x40, 0x4F, Quantity::Voltage, Unit::Volt, Scale::Decimal(-9)),
    vif(0x50, 0x5F, Quantity::Current, Unit::Ampere, Scale::Decimal(-12)),
    plain(0x60, Quantity::ResetCounter),
    plain(0x61, Quantity::CumulationCounter),
    plain(0x62, Quantity::ControlSignal),
    plain(0x63, Quantity::DayOfWeek),
    plain(0x64, Quantity::WeekNumber),
    plain(0x65, Quantity::DayChangeTime),
    plain(0x66, Quantity::ParameterActivationState),
    plain(0x67, Quantity::SupplierInformation),
    vif(0x68, 0x6B, Quantity::DurationSinceLastCumulation, Unit::Hour, Scale::LongDuration),
    vif(0x6C, 0x6F, Quantity::BatteryOperatingTime, Unit::Hour, Scale::LongDuration),
    time_point(0x70, Quantity::BatteryChangeDateTime, DecodeHint::DateTime),
];

/// Codes following VIF 0xFB, EN 13757-3 table 13.
pub const VIFE_FB_TABLE: &[VifEntry] = &[
    vif(0x00, 0x01, Quantity::Energy, Unit::WattHour, Scale::Decimal(5)),
    vif(0x08, 0x09, Quantity::Energy, Unit::Joule, Scale::Decimal(8)),
    vif(0x10, 0x11, Quantity::Volume, Unit::CubicMetre, Scale::Decimal(2)),
    vif(0x18, 0x19, Quantity::Mass, Unit::Kilogram, Scale::Decimal(5)),
    vif(0x21, 0x21, Quantity::Volume, Unit::CubicFeet, Scale::Fixed(-1)),
    vif(0x22, 0x22, Quantity::Volume, Unit::UsGallon, Scale::Fixed(-1)),
    vif(0x23, 0x23, Quantity::VolumeFlow, Unit::UsGallonPerMinute, Scale::Fixed(-3)),
    vif(0x24, 0x24, Quantity::VolumeFlow, Unit::UsGallonPerMinute, Scale::Fixed(0)),
    vif(0x25, 0x25, Quantity::VolumeFlow, Unit::UsGallonPerHour, Scale::Fixed(0)),
    vif(0x28, 0x29, Quantity::Power, Unit::Watt, Scale::Decimal(5)),
    vif(0x30, 0x31, Quantity::Power, Unit::JoulePerHour, Scale::Decimal(8)),
    vif(0x58, 0x5B, Quantity::FlowTemperature, Unit::Fahrenheit, Scale::Decimal(-3)),
    vif(0x5C, 0x5F, Quantity::ReturnTemperature, Unit::Fahrenheit, Scale::Decimal(-3)),
    vif(0x60, 0x63, Quantity::TemperatureDifference, Unit::Fahrenheit, Scale::Decimal(-3)),
    vif(0x64, 0x67, Quantity::ExternalTemperature, Unit::Fahrenheit, Scale::Decimal(-3)),
    vif(0x70, 0x73, Quantity::TemperatureLimit, Unit::Fahrenheit, Scale::Decimal(-3)),
    vif(0x74, 0x77, Quantity::TemperatureLimit, Unit::Celsius, Scale::Decimal(-3)),
    vif(0x78, 0x7F, Quantity::CumulativeMaxPower, Unit::Watt, Scale::Decimal(-3)),
];

fn lookup(table: &[VifEntry], code: u8) -> Option<VifInfo> {
    table
        .iter()
        .find(|entry| (entry.first..=entry.last).contains(&code))
        .map(|entry| entry.resolve(code))
}

/// Looks up a primary VIF code (extension bit ignored).
pub fn lookup_primary_vif(code: u8) -> Option<VifInfo> {
    lookup(PRIMARY_VIF_TABLE, code & 0x7F)
}

/// Looks up a code of the 0xFD extension table (extension bit ignored).
pub fn lookup_vife_fd(code: u8) -> Option<VifInfo> {
    lookup(VIFE_FD_TABLE, code & 0x7F)
}

/// Looks up a code of the 0xFB extension table (extension bit ignored).
pub fn lookup_vife_fb(code: u8) -> Option<VifInfo> {
    lookup(VIFE_FB_TABLE, code & 0x7F)
}

/// Meaning of a combinable (orthogonal) VIFE, EN 13757-3 table 14.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VifeKind {
    /// Record error code; the parameter is the error number.
    ErrorCode,
    PerSecond,
    PerMinute,
    PerHour,
    PerDay,
    PerWeek,
    PerMonth,
    PerYear,
    PerRevolution,
    /// Parameter is the input channel.
    IncrementPerInputPulse,
    /// Parameter is the output channel.
    IncrementPerOutputPulse,
    PerLitre,
    PerCubicMetre,
    PerKilogram,
    PerKelvin,
    PerKilowattHour,
    PerGigajoule,
    PerKilowatt,
    PerKelvinLitre,
    PerVolt,
    PerAmpere,
    MultipliedBySecond,
    MultipliedBySecondPerVolt,
    MultipliedBySecondPerAmpere,
    StartDateTimeOf,
    UncorrectedUnit,
    AccumulationPositiveOnly,
    AccumulationNegativeOnly,
    /// Parameter carries the limit, function and duration bits.
    LimitValue,
    LimitDuration,
    /// Exponent correction `10^(parameter - 6)`.
    MultiplicativeCorrection,
    /// Additive correction `10^(parameter - 3)` in the record's unit.
    AdditiveCorrection,
    /// Exponent correction `10^3`.
    MultiplicativeCorrectionThousand,
    FutureValue,
    /// All following VIFEs are manufacturer specific.
    ManufacturerSpecific,
    Reserved,
}

/// Row of the combinable VIFE table: `(first, last, kind)`.
pub type VifeEntry = (u8, u8, VifeKind);

pub const COMBINABLE_VIFE_TABLE: &[VifeEntry] = &[
    (0x00, 0x1F, VifeKind::ErrorCode),
    (0x20, 0x20, VifeKind::PerSecond),
    (0x21, 0x21, VifeKind::PerMinute),
    (0x22, 0x22, VifeKind::PerHour),
    (0x23, 0x23, VifeKind::PerDay),
    (0x24, 0x24, VifeKind::PerWeek),
    (0x25, 0x25, VifeKind::PerMonth),
    (0x26, 0x26, VifeKind::PerYear),
    (0x27, 0x27, VifeKind::PerRevolution),
    (0x28, 0x29, VifeKind::IncrementPerInputPulse),
    (0x2A, 0x2B, VifeKind::IncrementPerOutputPulse),
    (0x2C, 0x2C, VifeKind::PerLitre),
    (0x2D, 0x2D, VifeKind::PerCubicMetre),
    (0x2E, 0x2E, VifeKind::PerKilogram),
    (0x2F, 0x2F, VifeKind::PerKelvin),
    (0x30, 0x30, VifeKind::PerKilowattHour),
    (0x31, 0x31, VifeKind::PerGigajoule),
    (0x32, 0x32, VifeKind::PerKilowatt),
    (0x33, 0x33, VifeKind::PerKelvinLitre),
    (0x34, 0x34, VifeKind::PerVolt),
    (0x35, 0x35, VifeKind::PerAmpere),
    (0x36, 0x36, VifeKind::MultipliedBySecond),
    (0x37, 0x37, VifeKind::MultipliedBySecondPerVolt),
    (0x38, 0x38, VifeKind::MultipliedBySecondPerAmpere),
    (0x39, 0x39, VifeKind::StartDateTimeOf),
    (0x3A, 0x3A, VifeKind::UncorrectedUnit),
    (0x3B, 0x3B, VifeKind::AccumulationPositiveOnly),
    (0x3C, 0x3C, VifeKind::AccumulationNegativeOnly),
    (0x40, 0x5F, VifeKind::LimitValue),
    (0x60, 0x6F, VifeKind::LimitDuration),
    (0x70, 0x77, VifeKind::MultiplicativeCorrection),
    (0x78, 0x7B, VifeKind::AdditiveCorrection),
    (0x7D, 0x7D, VifeKind::MultiplicativeCorrectionThousand),
    (0x7E, 0x7E, VifeKind::FutureValue),
    (0x7F, 0x7F, VifeKind::ManufacturerSpecific),
];

/// A decoded combinable VIFE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VifeDescriptor {
    /// The VIFE byte with its extension bit cleared.
    pub code: u8,
    pub kind: VifeKind,
    /// Position of the code inside its table range.
    pub parameter: u8,
}

impl VifeDescriptor {
    /// Change to the record's decimal exponent implied by this VIFE.
    pub fn exponent_correction(&self) -> i8 {
        match self.kind {
            VifeKind::MultiplicativeCorrection => self.parameter as i8 - 6,
            VifeKind::MultiplicativeCorrectionThousand => 3,
            _ => 0,
        }
    }
}

/// Looks up a combinable VIFE (extension bit ignored).
pub fn lookup_combinable_vife(byte: u8) -> VifeDescriptor {
    let code = byte & 0x7F;
    COMBINABLE_VIFE_TABLE
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&code))
        .map(|(first, _, kind)| VifeDescriptor {
            code,
            kind: *kind,
            parameter: code - first,
        })
        .unwrap_or(VifeDescriptor {
            code,
            kind: VifeKind::Reserved,
            parameter: 0,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_table_well_formed(table: &[VifEntry]) {
        let mut previous: Option<u8> = None;
        for entry in table {
            assert!(entry.first <= entry.last, "{entry:?}");
            if let Some(previous) = previous {
                assert!(entry.first > previous, "overlap at {entry:?}");
            }
            previous = Some(entry.last);
        }
    }

    #[test]
    fn test_tables_sorted_and_disjoint() {
        assert_table_well_formed(PRIMARY_VIF_TABLE);
        assert_table_well_formed(VIFE_FD_TABLE);
        assert_table_well_formed(VIFE_FB_TABLE);
        let mut previous = None;
        for (first, last, _) in COMBINABLE_VIFE_TABLE {
            assert!(first <= last);
            if let Some(previous) = previous {
                assert!(*first > previous);
            }
            previous = Some(*last);
        }
    }

    #[test]
    fn test_primary_decimal_scale() {
        let info = lookup_primary_vif(0x13).unwrap();
        assert_eq!(info.quantity, Quantity::Volume);
        assert_eq!(info.unit, Unit::CubicMetre);
        assert_eq!(info.exponent, -3);

        let info = lookup_primary_vif(0x06).unwrap();
        assert_eq!((info.unit, info.exponent), (Unit::WattHour, 3));
        assert_eq!(unit_label(info.unit, info.exponent), "kWh");

        let info = lookup_primary_vif(0x5A).unwrap();
        assert_eq!((info.quantity, info.exponent), (Quantity::FlowTemperature, -1));
    }

    #[test]
    fn test_primary_durations() {
        assert_eq!(lookup_primary_vif(0x22).unwrap().unit, Unit::Hour);
        assert_eq!(lookup_primary_vif(0x27).unwrap().unit, Unit::Day);
        assert_eq!(lookup_primary_vif(0x74).unwrap().unit, Unit::Second);
    }

    #[test]
    fn test_structural_codes_not_in_primary_table() {
        for code in 0x7B..=0x7F {
            assert!(lookup_primary_vif(code).is_none());
        }
    }

    #[test]
    fn test_fd_table() {
        assert_eq!(lookup_vife_fd(0x08).unwrap().quantity, Quantity::AccessNumber);
        let volts = lookup_vife_fd(0x48).unwrap();
        assert_eq!((volts.unit, volts.exponent), (Unit::Volt, -1));
        let battery = lookup_vife_fd(0x6E).unwrap();
        assert_eq!(battery.unit, Unit::Month);
        assert!(lookup_vife_fd(0x19).is_none());
        assert!(lookup_vife_fd(0x71).is_none());
    }

    #[test]
    fn test_fb_table() {
        let energy = lookup_vife_fb(0x01).unwrap();
        assert_eq!((energy.unit, energy.exponent), (Unit::WattHour, 6));
        assert_eq!(unit_label(energy.unit, energy.exponent), "MWh");
        assert!(lookup_vife_fb(0x40).is_none());
    }

    #[test]
    fn test_combinable_vifes() {
        let correction = lookup_combinable_vife(0xF3);
        assert_eq!(correction.kind, VifeKind::MultiplicativeCorrection);
        assert_eq!(correction.exponent_correction(), -3);
        assert_eq!(lookup_combinable_vife(0x7D).exponent_correction(), 3);
        assert_eq!(lookup_combinable_vife(0x22).kind, VifeKind::PerHour);
        assert_eq!(lookup_combinable_vife(0x3B).kind, VifeKind::AccumulationPositiveOnly);
        let error = lookup_combinable_vife(0x15);
        assert_eq!((error.kind, error.parameter), (VifeKind::ErrorCode, 0x15));
        assert_eq!(lookup_combinable_vife(0x3E).kind, VifeKind::Reserved);
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(unit_label(Unit::CubicMetre, -3), "litre");
        assert_eq!(unit_label(Unit::CubicMetre, -2), "10^-2 m³");
        assert_eq!(unit_label(Unit::Kilogram, 3), "t");
        assert_eq!(unit_label(Unit::Watt, 6), "MW");
        assert_eq!(unit_label(Unit::None, 2), "10^2");
        assert_eq!(unit_label(Unit::Day, 0), "d");
    }
}
