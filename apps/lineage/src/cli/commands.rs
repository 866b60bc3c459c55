//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Commands open the database, run one operation, and, for the file
//! backend, write the snapshot back when the operation mutated it.

use crate::api;
use crate::config::Config;
use lineage_core::{
    Gender, LineageError, Person, PersonDraft, PersonId, PersonStore, StorageBackend,
    formats::{MAX_SNAPSHOT_SIZE, snapshot_from_bytes, snapshot_to_bytes},
};
use std::path::{Path, PathBuf};

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LineageError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LineageError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LineageError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LineageError> {
    let canonical = path.canonicalize().map_err(|e| {
        LineageError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LineageError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, LineageError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LineageError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(LineageError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LineageError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Print a JSON value for `--json-mode`.
fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn person_json(person: &Person) -> serde_json::Value {
    serde_json::to_value(api::PersonJson::from(person)).unwrap_or_default()
}

fn describe(person: &Person) -> String {
    let gender = person.gender.as_ref().map(Gender::as_str).unwrap_or("-");
    let parent = |p: Option<PersonId>| p.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
    format!(
        "#{:<5} {:<32} {:<7} father={:<5} mother={}",
        person.id.0,
        person.full_name,
        gender,
        parent(person.father_id),
        parent(person.mother_id)
    )
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), LineageError> {
    let mut config = Config::load(config_path)?.server;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let store = load_or_create_backend(db_path, backend)?;
    if !store.is_persistent() {
        tracing::warn!(
            "File backend: changes made through the server are not written back to {}",
            db_path.display()
        );
    }

    println!("Lineage Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.host);
    println!("  Port:     {}", config.port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET    /persons                        - List persons");
    println!("  POST   /persons                        - Create a person");
    println!("  GET    /persons/{{id}}                   - Fetch a person");
    println!("  DELETE /persons/{{id}}                   - Delete a person");
    println!("  GET    /persons/{{id}}/family            - Immediate family");
    println!("  GET    /persons/count?person_id=       - Family size");
    println!("  GET    /persons/gen?person_id=         - Paternal generations");
    println!("  GET    /persons/male_count?person_id=  - Males in family");
    println!("  GET    /persons/female_count?person_id= - Females in family");
    println!("  POST   /export                         - Export snapshot");
    println!("  GET    /status                         - Registry status");
    println!("  GET    /health                         - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(store, config).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show registry status.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), LineageError> {
    let store = load_or_create_backend(db_path, backend)?;
    let person_count = store.len()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "person_count": person_count,
            "next_id": store.next_id(),
        }));
        return Ok(());
    }

    println!("Lineage Registry Status");
    println!("=======================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Persons:  {}", person_count);
    println!("Next id:  {}", store.next_id());

    Ok(())
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

/// Insert a person.
pub fn cmd_add(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    name: String,
    gender: Option<&str>,
    father: Option<i64>,
    mother: Option<i64>,
) -> Result<(), LineageError> {
    let draft = PersonDraft {
        full_name: name,
        gender: gender.map(str::parse::<Gender>).transpose()?,
        father_id: father.map(PersonId),
        mother_id: mother.map(PersonId),
    };

    let mut store = load_or_create_backend(db_path, backend)?;
    let person = store.insert(draft)?;
    save_backend(&store, db_path)?;

    if json_mode {
        print_json(&person_json(&person));
    } else {
        println!("Added {}", describe(&person));
    }
    Ok(())
}

/// Delete a person. Children keep their parent reference.
pub fn cmd_remove(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: i64,
) -> Result<(), LineageError> {
    let mut store = load_or_create_backend(db_path, backend)?;
    let removed = store.delete_by_id(PersonId(id))?;
    save_backend(&store, db_path)?;

    if json_mode {
        print_json(&serde_json::json!({ "removed": person_json(&removed) }));
    } else {
        println!("Removed {}", describe(&removed));
    }
    Ok(())
}

/// List every person in id order.
pub fn cmd_list(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), LineageError> {
    let store = load_or_create_backend(db_path, backend)?;
    let persons = store.list_all()?;

    if json_mode {
        let list: Vec<serde_json::Value> = persons.iter().map(person_json).collect();
        print_json(&serde_json::Value::Array(list));
        return Ok(());
    }

    if persons.is_empty() {
        println!("No persons recorded");
    }
    for person in &persons {
        println!("{}", describe(person));
    }
    Ok(())
}

// =============================================================================
// RELATIONSHIP COMMANDS
// =============================================================================

/// Show the immediate family with gender totals.
pub fn cmd_family(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: i64,
) -> Result<(), LineageError> {
    let store = load_or_create_backend(db_path, backend)?;
    let family = store.family();
    let members = family.immediate_family(PersonId(id))?;
    let counts = family.gender_breakdown(PersonId(id))?;

    if json_mode {
        let list: Vec<serde_json::Value> = members.iter().map(person_json).collect();
        print_json(&serde_json::json!({
            "person_id": id,
            "members": list,
            "male": counts.male,
            "female": counts.female,
            "other": counts.other,
            "unknown": counts.unknown,
        }));
        return Ok(());
    }

    if members.is_empty() {
        println!("No person with id {}", id);
        return Ok(());
    }

    println!("Immediate family of #{}", id);
    println!("========================");
    for member in &members {
        println!("{}", describe(member));
    }
    println!();
    println!(
        "Male: {}  Female: {}  Other: {}  Unknown: {}  Total: {}",
        counts.male, counts.female, counts.other, counts.unknown, counts.total
    );
    Ok(())
}

/// Count generations along the paternal line.
pub fn cmd_generations(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: i64,
) -> Result<(), LineageError> {
    let store = load_or_create_backend(db_path, backend)?;
    let generations = store.family().generation_depth(PersonId(id))?;

    if json_mode {
        print_json(&serde_json::json!({ "person_id": id, "generations": generations }));
    } else {
        println!("Generations (paternal line) for #{}: {}", id, generations);
    }
    Ok(())
}

/// Count one gender within the immediate family.
pub fn cmd_gender_count(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: i64,
    gender: &str,
) -> Result<(), LineageError> {
    let gender: Gender = gender.parse()?;
    let store = load_or_create_backend(db_path, backend)?;
    let count = store.family().count_by_gender(PersonId(id), &gender)?;

    if json_mode {
        print_json(&serde_json::json!({
            "person_id": id,
            "gender": gender.as_str(),
            "count": count,
        }));
    } else {
        println!("{} in family of #{}: {}", gender, id, count);
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export all records (works with both backends).
pub fn cmd_export(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    output: &Path,
    format: &str,
) -> Result<(), LineageError> {
    let validated_output = validate_output_path(output)?;

    let store = load_or_create_backend(db_path, backend)?;
    let snapshot = store.snapshot()?;

    let data = match format {
        "snapshot" => snapshot_to_bytes(&snapshot)?,
        "json" => {
            let persons: Vec<api::PersonJson> =
                snapshot.persons.iter().map(api::PersonJson::from).collect();
            serde_json::to_vec_pretty(&persons)
                .map_err(|e| LineageError::SerializationError(e.to_string()))?
        }
        _ => {
            return Err(LineageError::InvalidInput(format!(
                "Unknown format: {}. Use: snapshot, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| LineageError::IoError(format!("Write file: {}", e)))?;

    if json_mode {
        print_json(&export_summary(
            snapshot.persons.len(),
            data.len(),
            format,
            &validated_output,
        ));
    } else {
        println!(
            "Exported {} persons ({} bytes) to {:?}",
            snapshot.persons.len(),
            data.len(),
            validated_output
        );
    }

    Ok(())
}

fn export_summary(persons: usize, bytes: usize, format: &str, output: &Path) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "exported": persons,
        "bytes": bytes,
        "format": format,
        "output": output.display().to_string(),
    })
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace every record with the snapshot's contents.
///
/// Ids and the id counter are preserved, so dangling references stay dangling.
pub fn cmd_import(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    input: &Path,
) -> Result<(), LineageError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| LineageError::IoError(format!("Read file: {}", e)))?;
    let snapshot = snapshot_from_bytes(&data)?;
    let count = snapshot.persons.len();

    let mut store = load_or_create_backend(db_path, backend)?;
    store.load_snapshot(snapshot)?;
    save_backend(&store, db_path)?;

    if json_mode {
        print_json(&import_summary(count, store.next_id()));
    } else {
        println!("Imported {} persons (next id {})", count, store.next_id());
    }

    Ok(())
}

fn import_summary(persons: usize, next_id: i64) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "imported": persons,
        "next_id": next_id,
    })
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), LineageError> {
    if db_path.exists() {
        if !force {
            return Err(LineageError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| LineageError::IoError(format!("Remove existing database: {}", e)))?;
    }

    match backend {
        "redb" => {
            StorageBackend::open_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        _ => {
            save_backend(&StorageBackend::in_memory(), db_path)?;
            println!("Initialized new file database at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the database with the selected backend.
///
/// For the file backend a missing file yields an empty registry.
pub fn load_or_create_backend(db_path: &Path, backend: &str) -> Result<StorageBackend, LineageError> {
    match backend {
        "redb" => StorageBackend::open_redb(db_path),
        "file" => {
            let mut store = StorageBackend::in_memory();
            if db_path.exists() {
                validate_file_size(db_path, MAX_SNAPSHOT_SIZE as u64)?;
                let data = std::fs::read(db_path)
                    .map_err(|e| LineageError::IoError(format!("Read db: {}", e)))?;
                store.load_snapshot(snapshot_from_bytes(&data)?)?;
            }
            Ok(store)
        }
        other => Err(LineageError::InvalidInput(format!(
            "Unknown backend: {}. Use: redb, file",
            other
        ))),
    }
}

/// Persist the store after a mutation.
///
/// redb commits on every write, so only the file backend needs work here.
pub fn save_backend(store: &StorageBackend, db_path: &Path) -> Result<(), LineageError> {
    if store.is_persistent() {
        return Ok(());
    }
    let data = snapshot_to_bytes(&store.snapshot()?)?;
    std::fs::write(db_path, &data)
        .map_err(|e| LineageError::IoError(format!("Write db: {}", e)))?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
