use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, info};
use rewriter_core::config::load_pipeline_description;
use rewriter_core::stage_manager::context::SharedOutput;
use rewriter_core::{PipelineRunner, ProcessingContext, Result, StageRegistry, StageRole};

/// Output file opened on the first write, so a pipeline that fails to
/// assemble leaves an existing file untouched
struct DeferredFile {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl DeferredFile {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
        }
    }

    fn file(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.file.is_none() {
            debug!("Creating output file {}", self.path.display());
            self.file = Some(BufWriter::new(File::create(&self.path)?));
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("output file was not opened"))
    }
}

impl Write for DeferredFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Registry holding every stage the binary ships with
fn registry() -> Result<StageRegistry> {
    Ok(StageRegistry::with_core_stages()?)
}

/// Run the pipeline described in `pipeline` over `input`, writing the
/// serializer's output to `output`.
pub fn run_pipeline(pipeline: &Path, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let description = load_pipeline_description(pipeline)?;

    let data = match input {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };
    debug!("Read {} bytes of input", data.len());

    let sink: SharedOutput = match output {
        Some(path) => Rc::new(RefCell::new(DeferredFile::new(path))),
        None => Rc::new(RefCell::new(io::stdout())),
    };
    let request_path = input.map(|path| path.display().to_string()).unwrap_or_else(|| "-".to_string());
    let context = ProcessingContext::new()
        .with_request_path(&request_path)
        .with_output(sink);

    let mut runner = PipelineRunner::new(Arc::new(registry()?));
    runner.init(&context, &description)?;
    runner.write_input(&data)?;
    runner.finish()?;
    if let Some(output) = context.output() {
        output.borrow_mut().flush()?;
    }

    info!("Pipeline '{}' processed '{}'", description.display_name(), request_path);
    Ok(())
}

/// Print the registered stages grouped by role
pub fn list_stages() -> Result<()> {
    let registry = registry()?;
    for (heading, role) in [
        ("Generators", StageRole::Generator),
        ("Transformers", StageRole::Transformer),
        ("Serializers", StageRole::Serializer),
    ] {
        println!("{}:", heading);
        for name in registry.type_names(role) {
            println!("  - {}", name);
        }
    }

    let (pre, post) = registry.injected_type_names();
    if !pre.is_empty() || !post.is_empty() {
        println!("Injected transformers:");
        for name in pre {
            println!("  - {} (pre)", name);
        }
        for name in post {
            println!("  - {} (post)", name);
        }
    }
    Ok(())
}

/// Resolve every stage of a description without running it
pub fn check_pipeline(pipeline: &Path) -> Result<()> {
    let description = load_pipeline_description(pipeline)?;
    let chain = registry()?.validate(&description)?;

    println!("Pipeline '{}' is valid:", description.display_name());
    for (role, name) in &chain {
        println!("  {}: {}", role, name);
    }
    let names: Vec<&str> = chain.iter().map(|(_, name)| name.as_str()).collect();
    println!("{}", names.join(" -> "));
    Ok(())
}
