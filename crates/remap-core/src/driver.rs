//! Remapping driver
//!
//! Runs the whole pipeline over an archive:
//! 1. Load every entry in parallel; class modules are summarized by the codec
//! 2. Sequence classes after their in-program parents
//! 3. Build the inheritance graph and seed the rename state
//! 4. Apply the rule documents in order
//! 5. Re-emit every class in parallel and write the output archive
//!
//! Shared structures are frozen behind `Arc` before any parallel phase reads
//! them. Task results are always collected in submission order.

use crate::archive::{copy_archive, ArchiveSink, ArchiveSource, DirectoryArchive};
use crate::codec::{ClassCodec, RemapView};
use crate::config::RemapConfig;
use crate::document::load_file;
use crate::error::{RemapError, Result, RuleError};
use crate::graph::InheritanceGraph;
use crate::program::{ClassInfo, Program};
use crate::rename::RenameState;
use crate::rules::RuleInterpreter;
use remap_kernel::Scheduler;
use remap_symbol::ClassToken;
use serde::Serialize;
use serde_yaml::Value;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// Summary of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemapReport {
    /// Class modules rewritten
    pub classes: usize,
    /// Other entries copied through
    pub opaque: usize,
    /// Classes with a new name
    pub renamed_classes: usize,
    /// Declared or inherited member entries with a new name
    pub renamed_members: usize,
    /// Access flag overrides applied
    pub flag_overrides: usize,
}

impl Display for RemapReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classes ({} renamed), {} member renames, {} flag overrides, {} other entries",
            self.classes, self.renamed_classes, self.renamed_members, self.flag_overrides, self.opaque
        )
    }
}

/// One loaded archive entry
enum Loaded {
    Class {
        entry: String,
        info: ClassInfo,
        bytes: Vec<u8>,
    },
    Opaque {
        entry: String,
        bytes: Vec<u8>,
    },
}

/// Rewritten archive content, ready to be written
struct Remapped {
    opaque: Vec<(String, Vec<u8>)>,
    classes: Vec<(String, Vec<u8>)>,
    report: RemapReport,
}

impl Remapped {
    fn write_to(self, sink: &mut dyn ArchiveSink) -> Result<RemapReport> {
        for (entry, bytes) in self.opaque.iter().chain(&self.classes) {
            sink.write(entry, bytes)?;
        }
        sink.finish()?;
        Ok(self.report)
    }
}

/// Applies rule files to archives
#[derive(Debug)]
pub struct Remapper<C> {
    config: RemapConfig,
    codec: Arc<C>,
}

impl<C: ClassCodec + 'static> Remapper<C> {
    /// Create a remapper
    #[must_use]
    pub fn new(config: RemapConfig, codec: C) -> Self {
        Self {
            config,
            codec: Arc::new(codec),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    /// Remap the configured directory archive
    ///
    /// The input is fully read before the output is created, so output and
    /// input may be the same directory.
    ///
    /// # Errors
    /// The first configuration, IO, codec, rule or scheduler failure.
    pub fn run(&self) -> Result<RemapReport> {
        self.config.validate()?;
        let (Some(maps), Some(input), Some(output)) = (
            self.config.maps.clone(),
            self.config.input.as_deref(),
            self.config.output_path().map(Path::to_path_buf),
        ) else {
            return Err(RemapError::Config("rule file and input are required".into()));
        };

        let source: Arc<dyn ArchiveSource> = Arc::new(DirectoryArchive::open(input)?);
        let scheduler = self.start()?;

        let outcome = (|| -> Result<Remapped> {
            let copy = match self.config.original.clone() {
                Some(path) => {
                    let source = Arc::clone(&source);
                    Some(scheduler.submit(move || preserve(&*source, &path))?)
                }
                None => None,
            };
            let rules = scheduler.submit(move || load_file(&maps))?;

            self.remap(
                &scheduler,
                &source,
                move || rules.get().map_err(RemapError::from),
                move || match copy {
                    Some(copy) => copy.get().map(drop).map_err(RemapError::from),
                    None => Ok(()),
                },
            )
        })();
        let remapped = finish(&scheduler, outcome)?;

        let mut sink = DirectoryArchive::create(&output)?;
        let report = remapped.write_to(&mut sink)?;
        tracing::info!(output = %output.display(), "{report}");
        Ok(report)
    }

    /// Remap an arbitrary archive with already loaded rule documents
    ///
    /// # Errors
    /// The first IO, codec, rule or scheduler failure.
    pub fn run_with(
        &self,
        source: Arc<dyn ArchiveSource>,
        documents: Vec<Value>,
        sink: &mut dyn ArchiveSink,
    ) -> Result<RemapReport> {
        let scheduler = self.start()?;
        let outcome = self.remap(&scheduler, &source, move || Ok(documents), || Ok(()));
        finish(&scheduler, outcome)?.write_to(sink)
    }

    fn start(&self) -> Result<Scheduler> {
        let workers = self.config.cores.saturating_sub(1);
        tracing::debug!(workers, "starting scheduler");
        Ok(Scheduler::new(workers)?)
    }

    fn remap(
        &self,
        scheduler: &Scheduler,
        source: &Arc<dyn ArchiveSource>,
        documents: impl FnOnce() -> Result<Vec<Value>>,
        preserved: impl FnOnce() -> Result<()>,
    ) -> Result<Remapped> {
        let verbose = self.config.missing.is_verbose();

        let mut loads = Vec::new();
        for entry in source.entries() {
            let source = Arc::clone(source);
            let codec = Arc::clone(&self.codec);
            loads.push(scheduler.submit(move || load_entry(&*source, &*codec, entry))?);
        }

        let mut program = Program::new();
        let mut classes = Vec::new();
        let mut opaque = Vec::new();
        for handle in loads {
            match handle.get()? {
                Loaded::Class { entry, info, bytes } => {
                    if verbose {
                        tracing::info!(class = %info.token, "loaded");
                    } else {
                        tracing::debug!(class = %info.token, "loaded");
                    }
                    classes.push((info.token.clone(), entry, bytes));
                    program.insert(info)?;
                }
                Loaded::Opaque { entry, bytes } => opaque.push((entry, bytes)),
            }
        }
        tracing::info!(classes = program.len(), other = opaque.len(), "archive loaded");

        let program = Arc::new(program.sequenced().map_err(RemapError::CircularHierarchy)?);
        let graph = Arc::new(InheritanceGraph::build(&program));
        let state = RenameState::seed(&program, &graph).map_err(RuleError::from)?;

        let documents = documents()?;
        let mut interpreter = RuleInterpreter::new(Arc::clone(&program), graph, state)
            .with_policy(self.config.missing)
            .with_find_parents(self.config.find_parents);
        interpreter.apply_all(&documents)?;
        let state = Arc::new(interpreter.into_state());

        preserved()?;

        let mut rewrites = Vec::with_capacity(classes.len());
        for (token, entry, bytes) in classes {
            let program = Arc::clone(&program);
            let state = Arc::clone(&state);
            let codec = Arc::clone(&self.codec);
            let correct_enums = self.config.correct_enums;
            rewrites.push(scheduler.submit(move || {
                let view = RemapView::new(&program, &state);
                let bytes = codec
                    .rewrite(&bytes, &view, correct_enums)
                    .map_err(|e| RemapError::codec(&entry, e))?;
                let current: &ClassToken = state.current_class(&token).unwrap_or(&token);
                Ok::<_, RemapError>((codec.entry_name(current), bytes))
            })?);
        }

        let mut rewritten = Vec::with_capacity(rewrites.len());
        for handle in rewrites {
            rewritten.push(handle.get()?);
        }

        let report = RemapReport {
            classes: rewritten.len(),
            opaque: opaque.len(),
            renamed_classes: state.renamed_classes(),
            renamed_members: state.renamed_signatures(),
            flag_overrides: state.flags().len(),
        };
        Ok(Remapped {
            opaque,
            classes: rewritten,
            report,
        })
    }
}

fn load_entry(source: &dyn ArchiveSource, codec: &dyn ClassCodec, entry: String) -> Result<Loaded> {
    let bytes = source.read(&entry)?;
    if !codec.is_class_entry(&entry) {
        return Ok(Loaded::Opaque { entry, bytes });
    }
    let info = codec
        .parse(&entry, &bytes)
        .map_err(|e| RemapError::codec(&entry, e))?;
    Ok(Loaded::Class { entry, info, bytes })
}

fn preserve(source: &dyn ArchiveSource, path: &Path) -> Result<usize> {
    let mut sink = DirectoryArchive::create(path)?;
    let count = copy_archive(source, &mut sink)?;
    tracing::info!(path = %path.display(), entries = count, "original preserved");
    Ok(count)
}

/// Shut the scheduler down, surfacing worker failures
fn finish<T>(scheduler: &Scheduler, outcome: Result<T>) -> Result<T> {
    let mut failures = scheduler.shutdown().into_iter();
    let first = failures.next();
    for failure in failures {
        tracing::error!("{failure}");
    }
    match (outcome, first) {
        (Ok(_), Some(failure)) => Err(failure.into()),
        (Err(err), Some(failure)) => {
            tracing::error!("{failure}");
            Err(err)
        }
        (outcome, None) => outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::codec::{ClassModel, ModelCodec};
    use crate::document::load_documents;

    fn module(model: &ClassModel) -> Vec<u8> {
        ModelCodec::encode(model).unwrap()
    }

    fn archive() -> Arc<dyn ArchiveSource> {
        Arc::new(
            MemoryArchive::new()
                .with_entry("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")
                .with_entry(
                    "a/B.class.json",
                    module(&ClassModel::new("a/B").with_superclass("a/A")),
                )
                .with_entry(
                    "a/A.class.json",
                    module(&ClassModel::new("a/A").with_method("m", "()V", 1, Vec::new())),
                ),
        )
    }

    #[test]
    fn report_counts() {
        let remapper = Remapper::new(RemapConfig::new().with_cores(1), ModelCodec);
        let documents = load_documents("- classes: {a/A: x/A}\n- members: {x/A m ()V: n}\n").unwrap();
        let mut sink = MemoryArchive::new();
        let report = remapper.run_with(archive(), documents, &mut sink).unwrap();

        assert_eq!(
            report,
            RemapReport {
                classes: 2,
                opaque: 1,
                renamed_classes: 1,
                renamed_members: 2,
                flag_overrides: 0,
            }
        );
        assert_eq!(
            sink.entries(),
            vec!["META-INF/MANIFEST.MF", "a/B.class.json", "x/A.class.json"]
        );
        assert!(report.to_string().starts_with("2 classes (1 renamed)"));
    }

    #[test]
    fn duplicate_class_is_fatal() {
        let source: Arc<dyn ArchiveSource> = Arc::new(
            MemoryArchive::new()
                .with_entry("one.class.json", module(&ClassModel::new("a/A")))
                .with_entry("two.class.json", module(&ClassModel::new("a/A"))),
        );
        let remapper = Remapper::new(RemapConfig::new().with_cores(3), ModelCodec);
        let err = remapper
            .run_with(source, Vec::new(), &mut MemoryArchive::new())
            .unwrap_err();
        assert!(matches!(err, RemapError::DuplicateClass(token) if token.as_str() == "a/A"));
    }

    #[test]
    fn malformed_module_names_entry() {
        let source: Arc<dyn ArchiveSource> =
            Arc::new(MemoryArchive::new().with_entry("bad.class.json", "nope"));
        let remapper = Remapper::new(RemapConfig::new(), ModelCodec);
        let err = remapper
            .run_with(source, Vec::new(), &mut MemoryArchive::new())
            .unwrap_err();
        assert!(matches!(err, RemapError::Codec { entry, .. } if entry == "bad.class.json"));
    }
}
