//! Purpose: Hold top-level CLI command dispatch for `pointbase`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit code semantics stay unchanged.
//! Invariants: Helpers in `main.rs` remain the source of shared parsing logic.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "pointbase", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::List {
            file,
            criteria,
            index,
        } => {
            let criteria = parse_criteria(&criteria)?;
            let store = Store::open(&file)?;
            if index {
                for (position, record) in store.filter_indexed(&criteria) {
                    emit_json(json!({
                        "index": position,
                        "record": Value::Object(record.clone()),
                    }));
                }
            } else {
                for record in store.filter(&criteria) {
                    emit_record(record);
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Get { file, criteria } => {
            let criteria = parse_criteria(&criteria)?;
            let store = Store::open(&file)?;
            let record = store.get_one(&criteria)?;
            emit_record(record);
            Ok(RunOutcome::ok())
        }
        Command::Prop {
            file,
            name,
            criteria,
            tol,
        } => {
            if tol < 0.0 {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--tol must not be negative"));
            }
            let criteria = parse_criteria(&criteria)?;
            let store = Store::open(&file)?;
            let value = store.get_property(&name, tol, &criteria)?;
            emit_json(json!({ "property": name, "value": value }));
            Ok(RunOutcome::ok())
        }
        Command::Add {
            file,
            data_json,
            backup,
        } => {
            let policy = backup.policy()?;
            let record = read_record_input(data_json)?;
            let mut store = Store::open(&file)?;
            store.append(record);
            store.save(&SaveOptions::new().backup(policy))?;
            emit_record(&store.records()[store.len() - 1]);
            Ok(RunOutcome::ok())
        }
        Command::Remove {
            file,
            criteria,
            backup,
        } => {
            let policy = backup.policy()?;
            let criteria = parse_criteria(&criteria)?;
            let mut store = Store::open(&file)?;
            let removed = store.remove(&criteria);
            store.save(&SaveOptions::new().backup(policy))?;
            emit_json(json!({ "removed": removed }));
            Ok(RunOutcome::ok())
        }
    }
}
