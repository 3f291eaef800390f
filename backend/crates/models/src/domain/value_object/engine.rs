//! Workflow engine and catalog value objects

use std::fmt;

use kernel::error::validation::{Constraint, FieldError};

use super::endpoint::RepositoryUrl;
use super::label::VersionLabel;

/// Workflow engines the platform recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineName {
    Snakemake,
    Nextflow,
    Toil,
    Cwltool,
    Arvados,
    Streamflow,
    Galaxy,
    Airflow,
    Dagster,
    Python,
    Shell,
    R,
    Julia,
    Matlab,
    Perl,
    Java,
    C,
    Cpp,
    Go,
    Rust,
}

impl EngineName {
    pub const ALL: [EngineName; 20] = {
        use EngineName::*;
        [
            Snakemake, Nextflow, Toil, Cwltool, Arvados, Streamflow, Galaxy, Airflow, Dagster,
            Python, Shell, R, Julia, Matlab, Perl, Java, C, Cpp, Go, Rust,
        ]
    };

    #[inline]
    pub const fn code(&self) -> &'static str {
        use EngineName::*;
        match self {
            Snakemake => "snakemake",
            Nextflow => "nextflow",
            Toil => "toil",
            Cwltool => "cwltool",
            Arvados => "arvados",
            Streamflow => "streamflow",
            Galaxy => "galaxy",
            Airflow => "airflow",
            Dagster => "dagster",
            Python => "python",
            Shell => "shell",
            R => "r",
            Julia => "julia",
            Matlab => "matlab",
            Perl => "perl",
            Java => "java",
            C => "c",
            Cpp => "c++",
            Go => "go",
            Rust => "rust",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        Self::ALL
            .into_iter()
            .find(|e| e.code() == code)
            .ok_or_else(|| {
                FieldError::new(
                    Constraint::UnknownVariant,
                    format!("unknown workflow engine `{code}`"),
                )
            })
    }
}

impl fmt::Display for EngineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowEngine {
    pub name: EngineName,
    pub version: Option<VersionLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogName {
    WorkflowHub,
    NfCore,
    SmkWfCatalog,
}

impl CatalogName {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use CatalogName::*;
        match self {
            WorkflowHub => "workflowhub",
            NfCore => "nf-core",
            SmkWfCatalog => "smk-wf-catalog",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        use CatalogName::*;
        match code {
            "workflowhub" => Ok(WorkflowHub),
            "nf-core" => Ok(NfCore),
            "smk-wf-catalog" => Ok(SmkWfCatalog),
            _ => Err(FieldError::new(
                Constraint::UnknownVariant,
                format!(
                    "unknown workflow catalog `{code}`, expected one of workflowhub, nf-core, smk-wf-catalog"
                ),
            )),
        }
    }
}

impl fmt::Display for CatalogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Public catalog a workflow is published in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowCatalog {
    pub name: CatalogName,
    pub url: RepositoryUrl,
}
