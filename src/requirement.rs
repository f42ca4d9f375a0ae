use crate::error::{AscentError, Result};
use std::fmt;

/// Pin operators understood in requirement lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOperator {
    /// `==`
    Exact,
    /// `>=`
    Minimum,
}

impl PinOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinOperator::Exact => "==",
            PinOperator::Minimum => ">=",
        }
    }

    /// Operators to look for, in priority order.
    pub fn recognized(check_greater_equal: bool) -> &'static [PinOperator] {
        if check_greater_equal {
            &[PinOperator::Exact, PinOperator::Minimum]
        } else {
            &[PinOperator::Exact]
        }
    }
}

impl fmt::Display for PinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pinned package taken from a requirement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    name: String,
    operator: PinOperator,
    version: String,
}

impl PackageReference {
    pub fn new(
        name: impl Into<String>,
        operator: PinOperator,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            operator,
            version: version.into(),
        }
    }

    /// Split a requirement line into name and pinned version.
    ///
    /// Extras (`name[a,b]`) are dropped from the name and environment markers
    /// (`; python_version < "3.12"`) from the version. Returns `None` when the
    /// line carries no recognized pin; callers skip such lines.
    pub fn expand(line: &str, check_greater_equal: bool) -> Option<Self> {
        Self::parse(line, check_greater_equal).ok()
    }

    /// Like [`PackageReference::expand`], reporting why a line was rejected.
    pub fn parse(line: &str, check_greater_equal: bool) -> Result<Self> {
        let unrecognized = || AscentError::RequirementParse(line.trim().to_string());

        let operator = PinOperator::recognized(check_greater_equal)
            .iter()
            .copied()
            .find(|op| line.contains(op.as_str()))
            .ok_or_else(unrecognized)?;

        let (name, version) = line
            .split_once(operator.as_str())
            .ok_or_else(unrecognized)?;

        let mut name = name.trim();
        if name.ends_with(']') {
            if let Some((base, _extras)) = name.split_once('[') {
                name = base.trim();
            }
        }

        let version = version.split(';').next().unwrap_or_default().trim();

        if name.is_empty() || version.is_empty() {
            return Err(unrecognized());
        }

        Ok(Self::new(name, operator, version))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> PinOperator {
        self.operator
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
