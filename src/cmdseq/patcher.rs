//! Inserts the postcompiler step behind `$bsp_exe`
//!
//! Each configuration is scanned once: find the sentinel, then look at the
//! single slot right after it. Only that slot is ever touched, so running
//! the patch again with the same arguments is a no-op.

use super::{CommandRecord, Sequence};

/// Placeholder Hammer substitutes with the BSP compiler; our step must run
/// directly after it.
pub const BSP_SENTINEL: &str = "$bsp_exe";

/// Substring that identifies an existing postcompiler step
pub const TOOL_MARKER: &str = "postcompiler";

/// What a patch run did across a whole sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchOutcome {
    /// Configurations in which the sentinel step was found
    pub configs_matched: usize,
    /// Commands inserted or replaced
    pub commands_changed: usize,
}

impl PatchOutcome {
    /// True when the sequence already held the desired step everywhere
    pub fn is_noop(&self) -> bool {
        self.commands_changed == 0
    }
}

/// Per-configuration scan state
enum ScanState {
    /// Still looking for the sentinel step
    Seeking,
    /// Sentinel seen; the next command decides insert/replace/no-op
    Found,
}

/// Ensure every buildable configuration runs `executable args` directly
/// after the sentinel step.
///
/// Decision on the slot following the sentinel:
/// - no reference to the tool there -> insert a new record
/// - tool is there with different arguments -> replace that record
/// - tool is there with the same arguments -> leave the config alone
///
/// Configurations without the sentinel are not touched. The caller must
/// only rewrite the file when `commands_changed > 0`.
pub fn ensure_tool_step(seq: &mut Sequence, executable: &str, args: &str) -> PatchOutcome {
    let mut outcome = PatchOutcome::default();

    for config in &mut seq.configs {
        let mut state = ScanState::Seeking;
        let mut index = 0;

        while index <= config.commands.len() {
            match state {
                ScanState::Seeking => {
                    let Some(cmd) = config.commands.get(index) else {
                        break;
                    };
                    if cmd.executable.eq_ignore_ascii_case(BSP_SENTINEL) {
                        state = ScanState::Found;
                    }
                }
                ScanState::Found => {
                    outcome.configs_matched += 1;
                    match config.commands.get(index) {
                        Some(next) if references_tool(next) => {
                            if !next.args.eq_ignore_ascii_case(args) {
                                config.commands[index] = CommandRecord::new(executable, args);
                                outcome.commands_changed += 1;
                            }
                        }
                        // Sentinel was the last step, or the next step is
                        // something else entirely: wedge ours in here.
                        _ => {
                            config
                                .commands
                                .insert(index, CommandRecord::new(executable, args));
                            outcome.commands_changed += 1;
                        }
                    }
                    break;
                }
            }
            index += 1;
        }
    }

    outcome
}

fn references_tool(cmd: &CommandRecord) -> bool {
    cmd.executable.to_ascii_lowercase().contains(TOOL_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdseq::{encode, SequenceConfig};

    const TOOL_EXE: &str = "C:\\game\\bin\\postcompiler\\postcompiler.exe";

    fn config(commands: Vec<CommandRecord>) -> SequenceConfig {
        SequenceConfig { name: "Default".to_string(), commands }
    }

    fn seq(commands: Vec<CommandRecord>) -> Sequence {
        Sequence { version: 0.2, configs: vec![config(commands)] }
    }

    fn exes(seq: &Sequence) -> Vec<&str> {
        seq.configs[0]
            .commands
            .iter()
            .map(|c| c.executable.as_str())
            .collect()
    }

    #[test]
    fn test_insert_after_sentinel() {
        let mut seq = seq(vec![
            CommandRecord::new("$csg_exe", ""),
            CommandRecord::new("$bsp_exe", "-game $gamedir"),
            CommandRecord::new("$vis_exe", ""),
        ]);
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        assert_eq!(outcome, PatchOutcome { configs_matched: 1, commands_changed: 1 });
        assert_eq!(exes(&seq), vec!["$csg_exe", "$bsp_exe", TOOL_EXE, "$vis_exe"]);
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut seq = seq(vec![
            CommandRecord::new("$bsp_exe", ""),
            CommandRecord::new("$vis_exe", ""),
        ]);
        ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        let before = encode(&seq).unwrap();

        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        assert_eq!(outcome, PatchOutcome { configs_matched: 1, commands_changed: 0 });
        assert!(outcome.is_noop());
        assert_eq!(encode(&seq).unwrap(), before);
    }

    #[test]
    fn test_changed_args_replace_in_place() {
        let mut seq = seq(vec![
            CommandRecord::new("$bsp_exe", ""),
            CommandRecord::new(TOOL_EXE, "--propcombine"),
            CommandRecord::new("$vis_exe", ""),
        ]);
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine --dump-cache");
        assert_eq!(outcome, PatchOutcome { configs_matched: 1, commands_changed: 1 });
        // Replaced, not duplicated
        assert_eq!(exes(&seq), vec!["$bsp_exe", TOOL_EXE, "$vis_exe"]);
        assert_eq!(seq.configs[0].commands[1].args, "--propcombine --dump-cache");
    }

    #[test]
    fn test_args_compare_case_insensitive() {
        let mut seq = seq(vec![
            CommandRecord::new("$BSP_EXE", ""),
            CommandRecord::new("c:\\bin\\POSTCOMPILER.exe", "--PropCombine"),
        ]);
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        assert!(outcome.is_noop());
        assert_eq!(outcome.configs_matched, 1);
    }

    #[test]
    fn test_missing_sentinel_leaves_config_untouched() {
        let mut seq = seq(vec![
            CommandRecord::new("$vis_exe", ""),
            CommandRecord::new("$light_exe", ""),
        ]);
        let before = encode(&seq).unwrap();
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        assert_eq!(outcome, PatchOutcome::default());
        assert_eq!(encode(&seq).unwrap(), before);
    }

    #[test]
    fn test_sentinel_as_last_step_appends() {
        let mut seq = seq(vec![CommandRecord::new("$bsp_exe", "")]);
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        assert_eq!(outcome, PatchOutcome { configs_matched: 1, commands_changed: 1 });
        assert_eq!(exes(&seq), vec!["$bsp_exe", TOOL_EXE]);
    }

    #[test]
    fn test_only_first_sentinel_slot_considered() {
        let mut seq = seq(vec![
            CommandRecord::new("$bsp_exe", ""),
            CommandRecord::new("$vis_exe", ""),
            CommandRecord::new("$bsp_exe", ""),
        ]);
        let outcome = ensure_tool_step(&mut seq, TOOL_EXE, "--propcombine");
        // One insertion after the first sentinel, then the scan stops
        assert_eq!(outcome.commands_changed, 1);
        assert_eq!(
            exes(&seq),
            vec!["$bsp_exe", TOOL_EXE, "$vis_exe", "$bsp_exe"]
        );
    }

    #[test]
    fn test_counts_across_multiple_configs() {
        let mut sequence = Sequence {
            version: 0.2,
            configs: vec![
                config(vec![CommandRecord::new("$bsp_exe", ""), CommandRecord::new("$vis_exe", "")]),
                config(vec![CommandRecord::new("$light_exe", "")]),
                config(vec![
                    CommandRecord::new("$bsp_exe", ""),
                    CommandRecord::new(TOOL_EXE, "--propcombine"),
                ]),
            ],
        };
        let outcome = ensure_tool_step(&mut sequence, TOOL_EXE, "--propcombine");
        assert_eq!(outcome.configs_matched, 2);
        assert_eq!(outcome.commands_changed, 1);
    }
}
