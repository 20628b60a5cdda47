#[cfg(test)]
mod tests {
    use crate::config::CompilerConfig;
    use crate::sync::RouteCompiler;
    use crate::watch::{
        plan_action, EventAction, OrchestratorState, WatchEvent, WatchEventKind, WatchOrchestrator,
    };
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let routes = dir.path().join("routes");
        let pages = dir.path().join("pages");
        fs::create_dir_all(&routes).unwrap();
        write(
            &routes,
            "page.tsx",
            "export default function Page() { return null; }\n",
        );
        (dir, routes, pages)
    }

    fn wait_until(what: &str, mut probe: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if probe() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("timed out waiting for {}", what);
    }

    #[test]
    fn test_plan_action_classification() {
        let (_dir, routes, _pages) = setup();
        write(&routes, "(a)/layout.tsx", "export default function L() {}\n");
        write(&routes, "_app.tsx", "export default function App() {}\n");
        write(&routes, "notes.txt", "not a source file\n");

        let event = |kind, rel: &str| WatchEvent {
            kind,
            path: routes.join(rel),
        };

        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Add, "new/page.tsx")),
            EventAction::ScheduleFull
        );
        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Delete, "page.tsx")),
            EventAction::ScheduleFull
        );
        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Change, "_app.tsx")),
            EventAction::ScheduleFull
        );
        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Change, "page.tsx")),
            EventAction::RegenerateNow(routes.join("page.tsx"))
        );
        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Change, "(a)/layout.tsx")),
            EventAction::RegenerateNow(routes.join("(a)/layout.tsx"))
        );
        assert_eq!(
            plan_action(&routes, &event(WatchEventKind::Change, "notes.txt")),
            EventAction::Ignore
        );
        // Events outside the tree root never reach the planner's table.
        let outside = WatchEvent {
            kind: WatchEventKind::Change,
            path: PathBuf::from("/elsewhere/page.tsx"),
        };
        assert_eq!(plan_action(&routes, &outside), EventAction::Ignore);
    }

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!(WatchEventKind::parse("add"), Some(WatchEventKind::Add));
        assert_eq!(WatchEventKind::parse("change"), Some(WatchEventKind::Change));
        assert_eq!(WatchEventKind::parse("delete"), Some(WatchEventKind::Delete));
        assert_eq!(WatchEventKind::parse("unlink"), Some(WatchEventKind::Delete));
        assert_eq!(WatchEventKind::parse("rename"), None);
    }

    #[test]
    fn test_startup_pass_then_idle() {
        let (_dir, routes, pages) = setup();
        let mut config = CompilerConfig::new(
            routes.to_string_lossy().to_string(),
            pages.to_string_lossy().to_string(),
        );
        config.debounce_ms = 20;
        let compiler = Arc::new(RouteCompiler::new(config).unwrap());
        let orchestrator = WatchOrchestrator::start(compiler);

        wait_until("startup pass", || pages.join("index.js").is_file());
        wait_until("idle state", || {
            orchestrator.state() == OrchestratorState::Idle
        });
    }

    #[test]
    fn test_change_event_regenerates_single_artifact() {
        let (_dir, routes, pages) = setup();
        let mut config = CompilerConfig::new(
            routes.to_string_lossy().to_string(),
            pages.to_string_lossy().to_string(),
        );
        config.debounce_ms = 20;
        let compiler = Arc::new(RouteCompiler::new(config).unwrap());
        let orchestrator = WatchOrchestrator::start(compiler);
        wait_until("startup pass", || pages.join("index.js").is_file());

        write(
            &routes,
            "page.tsx",
            "export default function Page() { return null; }\nexport async function getServerSideProps(ctx) { return { props: {} }; }\n",
        );
        orchestrator.notify(WatchEvent {
            kind: WatchEventKind::Change,
            path: routes.join("page.tsx"),
        });

        wait_until("loader wired into artifact", || {
            fs::read_to_string(pages.join("index.js"))
                .map(|text| text.contains("pageLoader"))
                .unwrap_or(false)
        });
    }

    #[test]
    fn test_add_burst_coalesces_into_one_full_pass() {
        let (_dir, routes, pages) = setup();
        let mut config = CompilerConfig::new(
            routes.to_string_lossy().to_string(),
            pages.to_string_lossy().to_string(),
        );
        config.debounce_ms = 50;
        let compiler = Arc::new(RouteCompiler::new(config).unwrap());
        let orchestrator = WatchOrchestrator::start(compiler);
        wait_until("startup pass", || pages.join("index.js").is_file());

        for name in ["alpha", "beta", "gamma"] {
            write(
                &routes,
                &format!("{}/page.tsx", name),
                "export default function Page() { return null; }\n",
            );
            orchestrator.notify(WatchEvent {
                kind: WatchEventKind::Add,
                path: routes.join(name).join("page.tsx"),
            });
        }

        // Nothing is written during the quiet period; the burst lands as
        // one pass after the window expires.
        wait_until("coalesced pass", || {
            ["alpha.js", "beta.js", "gamma.js"]
                .iter()
                .all(|artifact| pages.join(artifact).is_file())
        });
    }

    #[test]
    fn test_delete_event_removes_stale_artifact() {
        let (_dir, routes, pages) = setup();
        write(
            &routes,
            "extra/page.tsx",
            "export default function Page() { return null; }\n",
        );
        let mut config = CompilerConfig::new(
            routes.to_string_lossy().to_string(),
            pages.to_string_lossy().to_string(),
        );
        config.debounce_ms = 20;
        let compiler = Arc::new(RouteCompiler::new(config).unwrap());
        let orchestrator = WatchOrchestrator::start(compiler);
        wait_until("startup pass", || pages.join("extra.js").is_file());

        fs::remove_file(routes.join("extra/page.tsx")).unwrap();
        orchestrator.notify(WatchEvent {
            kind: WatchEventKind::Delete,
            path: routes.join("extra/page.tsx"),
        });

        wait_until("stale artifact removal", || !pages.join("extra.js").exists());
    }
}
