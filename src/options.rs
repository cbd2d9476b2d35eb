//! Compilation options.

/// Options shared by the resolver and the emitter.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Inject the kernel module into every compiled module
    pub kernel: bool,
    /// Definition whose free functions are exported without a prefix.
    /// Defaults to the first definition of the root module.
    pub entry: Option<String>,
    /// Host module name for the memory and allocator imports
    pub import_module: String,
    /// Minimum size in pages of the imported memory
    pub memory_pages: u64,
    /// Maximum size in pages of the imported memory
    pub max_memory_pages: Option<u64>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            kernel: true,
            entry: None,
            import_module: String::from("kernel"),
            memory_pages: 1,
            max_memory_pages: None,
        }
    }
}
