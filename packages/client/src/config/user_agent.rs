//! User agent string
//!
//! Layout: `product/version platform runtime/version (date patchlevel N) engine`.
//! A revision build appends `dev` to the runtime version and reports
//! `revision R` instead of a patchlevel. The runtime section is optional and
//! the trailing engine only appears when it differs from the runtime.

use std::fmt;

/// How the runtime build is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Build {
    /// Released build with a patchlevel
    Patchlevel(u32),
    /// Development build identified by a source revision
    Revision(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Runtime {
    name: String,
    version: String,
    release_date: String,
    build: Build,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    product: String,
    product_version: String,
    platform: String,
    runtime: Option<Runtime>,
    engine: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::new("pkgfetch", env!("CARGO_PKG_VERSION"))
    }
}

impl UserAgent {
    /// A user agent for `product` on the local platform.
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            product_version: version.into(),
            platform: local_platform(),
            runtime: None,
            engine: None,
        }
    }

    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    #[must_use]
    pub fn runtime(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        release_date: impl Into<String>,
        build: Build,
    ) -> Self {
        self.runtime = Some(Runtime {
            name: name.into(),
            version: version.into(),
            release_date: release_date.into(),
            build,
        });
        self
    }

    /// Alternate engine name, appended last unless it is the runtime itself.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.product, self.product_version, self.platform)?;

        if let Some(runtime) = &self.runtime {
            let dev = match runtime.build {
                Build::Revision(_) => "dev",
                Build::Patchlevel(_) => "",
            };
            write!(
                f,
                " {}/{}{} ({}",
                runtime.name, runtime.version, dev, runtime.release_date
            )?;
            match &runtime.build {
                Build::Patchlevel(level) => write!(f, " patchlevel {level})")?,
                Build::Revision(revision) => write!(f, " revision {revision})")?,
            }
        }

        let default_engine = self.runtime.as_ref().map(|runtime| runtime.name.as_str());
        if let Some(engine) = self.engine.as_deref().filter(|e| Some(*e) != default_engine) {
            write!(f, " {engine}")?;
        }

        Ok(())
    }
}

fn local_platform() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}
