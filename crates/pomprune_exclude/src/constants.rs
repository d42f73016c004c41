/// Selector list file name inside the reactor's configuration directory
pub const EXCLUDES_FILE_NAME: &str = "excludes.txt";

/// Rewritten descriptor written next to each original
pub const DEFAULT_OUTPUT_NAME: &str = ".exclude-pom.xml";
