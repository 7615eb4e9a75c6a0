//! CR300 series program synthesis.
//!
//! Every sensor on the bus logs into one shared record table. The generated
//! program triggers each sensor in turn, waits for the measurement, reads the
//! responses into a handful of scratch arrays shared by all sensors, and
//! copies the interesting values into per-sensor public variables. A failed
//! trigger or read stores `NAN` in every variable it would have filled.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};
use core::str::FromStr;
use core::time::Duration;

use tracing::{debug, trace};

use crate::common::timing::{ADDITIONAL_MEASURE_WAIT, STANDARD_MEASURE_WAIT};
use crate::common::{GenerateError, Sdi12Addr, SchemaFault};
use crate::schema::{self, CommandGroup, GeneratedVariable, SAP_FLOW_SCHEMA};

use super::validate::{IntervalPolicy, Validator};
use super::{GeneratedProgram, LoggerType, ProgramSynthesizer, SynthesisRequest};

/// Name of the single record table.
pub const TABLE_NAME: &str = "SapFlowAll";

/// Logger-side housekeeping values, declared and logged ahead of sensor data.
const PANEL_TEMP: &str = "PTemp";
const BATTERY: &str = "Batt_volt";

const CMD_VAR: &str = "SDI12CmdString";
const RETURN_VAR: &str = "SDI12ReturnCode";
const EXPECTED_VAR: &str = "SDI12ExpectedValues";

/// Named program constants for the documented waits. `Delay` refers to these
/// by name; any other wait is written out literally.
const WAIT_CONSTANTS: [(&str, Duration); 2] = [
    ("STD_MEAS_WAIT_MS", STANDARD_MEASURE_WAIT),
    ("ADD_MEAS_WAIT_MS", ADDITIONAL_MEASURE_WAIT),
];

const INDENT: &str = "  ";

/// Control port the SDI-12 bus is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sdi12Port {
    #[default]
    C1,
    C2,
}

impl Sdi12Port {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Sdi12Port::C1 => "C1",
            Sdi12Port::C2 => "C2",
        }
    }
}

impl fmt::Display for Sdi12Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a port name is neither `C1` nor `C2`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SDI-12 port must be C1 or C2, got '{0}'")]
pub struct ParsePortError(pub String);

impl FromStr for Sdi12Port {
    type Err = ParsePortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("C1") {
            Ok(Sdi12Port::C1)
        } else if s.eq_ignore_ascii_case("C2") {
            Ok(Sdi12Port::C2)
        } else {
            Err(ParsePortError(s.into()))
        }
    }
}

/// Synthesizer for CR300 series loggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cr300Synthesizer {
    port: Sdi12Port,
    validator: Validator,
}

impl Cr300Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: Sdi12Port) -> Self {
        self.port = port;
        self
    }

    pub fn with_interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.validator = Validator::new(policy);
        self
    }

    pub fn port(&self) -> Sdi12Port {
        self.port
    }

    pub fn interval_policy(&self) -> IntervalPolicy {
        self.validator.interval_policy
    }
}

impl ProgramSynthesizer for Cr300Synthesizer {
    fn logger_type(&self) -> LoggerType {
        LoggerType::Cr300
    }

    fn validate(
        &self,
        sensor_count: i64,
        interval_minutes: i64,
    ) -> Result<SynthesisRequest, GenerateError> {
        self.validator.validate(sensor_count, interval_minutes)
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<GeneratedProgram, GenerateError> {
        synthesize_with_schema(request, self.port, &SAP_FLOW_SCHEMA)
    }
}

/// Variables of one sensor, one inner `Vec` per command group.
struct SensorPlan {
    address: Sdi12Addr,
    groups: Vec<Vec<GeneratedVariable>>,
}

impl SensorPlan {
    fn variables(&self) -> impl Iterator<Item = &GeneratedVariable> {
        self.groups.iter().flatten()
    }
}

fn plan_sensors(
    request: &SynthesisRequest,
    schema: &[CommandGroup],
) -> Result<Vec<SensorPlan>, GenerateError> {
    request
        .addresses()
        .map(|address| -> Result<SensorPlan, GenerateError> {
            let address = address?;
            let groups = schema
                .iter()
                .enumerate()
                .map(|(idx, group)| schema::group_variables(address, idx, group))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SensorPlan { address, groups })
        })
        .collect()
}

fn synthesize_with_schema(
    request: &SynthesisRequest,
    port: Sdi12Port,
    schema: &[CommandGroup],
) -> Result<GeneratedProgram, GenerateError> {
    schema::check(schema)?;
    debug!(
        sensors = request.sensor_count(),
        interval_min = request.interval_minutes(),
        port = port.as_str(),
        "synthesizing CR300 program"
    );

    let sensors = plan_sensors(request, schema)?;
    let mut w = ProgramWriter::default();

    emit_header(&mut w, request);
    emit_constants(&mut w, request, port);
    emit_declarations(&mut w, schema, &sensors);
    emit_table(&mut w, &sensors);
    emit_main_program(&mut w, schema, &sensors)?;

    debug!(bytes = w.out.len(), "CR300 program complete");
    Ok(GeneratedProgram(w.out))
}

// ── Text output ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ProgramWriter {
    out: String,
}

impl ProgramWriter {
    fn line(&mut self, depth: usize, text: impl fmt::Display) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        let _ = writeln!(self.out, "{text}");
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `a = NAN : b = NAN : ...` on one line.
    fn nan_line<'v>(&mut self, depth: usize, vars: impl IntoIterator<Item = &'v GeneratedVariable>) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        for (i, var) in vars.into_iter().enumerate() {
            if i > 0 {
                self.out.push_str(" : ");
            }
            let _ = write!(self.out, "{} = NAN", var.name());
        }
        self.out.push('\n');
    }
}

/// Scratch array holding a response of `n` values.
#[derive(Clone, Copy)]
struct Scratch(u8);

impl fmt::Display for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TempD_{}Val", self.0)
    }
}

/// Delay argument for a wait: a named constant where one exists.
struct DelayMs(Duration);

impl fmt::Display for DelayMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match WAIT_CONSTANTS.iter().find(|(_, wait)| *wait == self.0) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{}", self.0.as_millis()),
        }
    }
}

fn emit_header(w: &mut ProgramWriter, request: &SynthesisRequest) {
    w.line(0, "' CR300 Series Datalogger Program");
    w.line(0, "' Program to log specified data from Implexx Sap Flow Sensors");
    w.line(0, format_args!("' Generated by {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
    w.line(0, format_args!("' Number of Sensors: {}", request.sensor_count()));
    w.line(0, format_args!("' Measurement Interval: {} minutes", request.interval_minutes()));
    w.line(
        0,
        format_args!("' Implexx Standard Measurement Wait: {} sec", STANDARD_MEASURE_WAIT.as_secs()),
    );
    w.line(
        0,
        format_args!("' Implexx Additional Measurement Wait: {} sec", ADDITIONAL_MEASURE_WAIT.as_secs()),
    );
    w.blank();
}

fn emit_constants(w: &mut ProgramWriter, request: &SynthesisRequest, port: Sdi12Port) {
    w.line(0, "'--- Constants ---");
    w.line(0, format_args!("Const MEAST_INTERVAL_MIN = {}", request.interval_minutes()));
    w.line(0, format_args!("Const SDI12_PORT = {port} ' SDI-12 control port (C1 or C2)"));
    for (name, wait) in WAIT_CONSTANTS {
        w.line(0, format_args!("Const {name} = {}", wait.as_millis()));
    }
    w.blank();
}

fn emit_declarations(w: &mut ProgramWriter, schema: &[CommandGroup], sensors: &[SensorPlan]) {
    w.line(0, "'--- Declare Public Variables ---");
    w.line(0, format_args!("Public {PANEL_TEMP} As Float"));
    w.line(0, format_args!("Public {BATTERY} As Float"));
    w.blank();

    w.line(
        0,
        format_args!(
            "' Variables to hold the {} measurements per sensor",
            schema::points_per_sensor(schema)
        ),
    );
    for var in sensors.iter().flat_map(|s| s.variables()) {
        w.line(0, format_args!("Public {0} As Float : Units {0}={1}", var.name(), var.unit));
    }
    w.blank();

    // Shared by every sensor and every group with the same response size.
    w.line(0, "' Scratch arrays for SDI12Recorder responses");
    for size in schema::response_sizes(schema) {
        w.line(0, format_args!("Dim {}({size}) As Float", Scratch(size)));
    }
    w.blank();

    w.line(0, format_args!("Dim {CMD_VAR} As String * 10"));
    w.line(0, format_args!("Dim {RETURN_VAR} As Long"));
    w.line(0, format_args!("Dim {EXPECTED_VAR} As Long ' Value count from the aM! response"));
    w.blank();
}

fn emit_table(w: &mut ProgramWriter, sensors: &[SensorPlan]) {
    w.line(0, "'--- DataTable Definition ---");
    w.line(0, format_args!("DataTable ({TABLE_NAME}, True, -1)"));
    w.line(1, "DataInterval (0, MEAST_INTERVAL_MIN, Min, 0)");
    w.line(1, format_args!("Sample (1, {PANEL_TEMP}, FP2)"));
    w.line(1, format_args!("Sample (1, {BATTERY}, FP2)"));
    for var in sensors.iter().flat_map(|s| s.variables()) {
        w.line(1, format_args!("Sample (1, {}, IEEE4)", var.name()));
    }
    w.line(0, "EndTable");
    w.blank();
}

fn emit_main_program(
    w: &mut ProgramWriter,
    schema: &[CommandGroup],
    sensors: &[SensorPlan],
) -> Result<(), GenerateError> {
    w.line(0, "'--- Main Program ---");
    w.line(0, "SequentialMode");
    w.line(0, "BeginProg");
    w.line(1, "Scan (MEAST_INTERVAL_MIN, Min, 0, 0)");
    w.line(2, format_args!("PanelTemp ({PANEL_TEMP}, 60)"));
    w.line(2, format_args!("Battery ({BATTERY})"));
    w.blank();

    for sensor in sensors {
        trace!(address = %sensor.address, "emitting sensor block");
        emit_sensor_block(w, schema, sensor)?;
    }

    w.line(2, format_args!("CallTable {TABLE_NAME}"));
    w.line(1, "NextScan");
    w.line(0, "EndProg");
    Ok(())
}

fn emit_sensor_block(
    w: &mut ProgramWriter,
    schema: &[CommandGroup],
    sensor: &SensorPlan,
) -> Result<(), GenerateError> {
    let address = sensor.address;
    w.line(2, format_args!("' --- Sensor {address} (Address \"{address}\") ---"));

    let mut first_group = 0;
    for block in schema::trigger_blocks(schema) {
        let block_vars = &sensor.groups[first_group..first_group + block.len()];
        let trigger = block[0].trigger_command(address).format_into().map_err(|_| {
            GenerateError::SchemaInconsistency { group: first_group, fault: SchemaFault::InvalidCommandIndex }
        })?;

        w.line(2, format_args!("{CMD_VAR} = \"{trigger}\""));
        w.line(
            2,
            format_args!("SDI12Recorder ({RETURN_VAR}, SDI12_PORT, {CMD_VAR}, {EXPECTED_VAR}, 1.0, 0)"),
        );
        w.line(2, format_args!("If {RETURN_VAR} = 0 Then"));
        if !block[0].wait.is_zero() {
            w.line(3, format_args!("Delay (0, {}, mSec)", DelayMs(block[0].wait)));
        }

        // Each read gets its own return code, so one failed read leaves the
        // other reads of the same measurement untouched.
        for (offset, (group, vars)) in block.iter().zip(block_vars).enumerate() {
            emit_read(w, address, first_group + offset, group, vars)?;
        }

        w.line(2, "Else");
        w.nan_line(3, block_vars.iter().flatten());
        w.line(2, "EndIf");
        w.blank();

        first_group += block.len();
    }
    Ok(())
}

fn emit_read(
    w: &mut ProgramWriter,
    address: Sdi12Addr,
    group_idx: usize,
    group: &CommandGroup,
    vars: &[GeneratedVariable],
) -> Result<(), GenerateError> {
    let read = group.read_command(address).format_into().map_err(|_| {
        GenerateError::SchemaInconsistency { group: group_idx, fault: SchemaFault::InvalidCommandIndex }
    })?;
    let scratch = Scratch(group.response_size);

    w.line(3, format_args!("{CMD_VAR} = \"{read}\""));
    w.line(
        3,
        format_args!(
            "SDI12Recorder ({RETURN_VAR}, SDI12_PORT, {CMD_VAR}, {scratch}(1), 1.0, 0, -1, {})",
            group.response_size
        ),
    );
    w.line(3, format_args!("If {RETURN_VAR} = 0 Then"));
    for (dp, var) in group.data_points.iter().zip(vars) {
        // Arrays in the target dialect are 1-based.
        w.line(4, format_args!("{} = {scratch}({})", var.name(), dp.response_index + 1));
    }
    w.line(3, "Else");
    w.nan_line(4, vars);
    w.line(3, "EndIf");
    Ok(())
}
