use speculate2::speculate;

speculate! {
    use keystone_core::catalog::catalog_template;
    use keystone_core::models::*;
    use keystone_core::{Database, Error, Pricing};
    use serde_json::json;

    fn setup_db() -> Database {
        Database::open_memory().expect("Failed to create test database")
    }

    fn create_test_project(db: &Database, name: &str) -> Project {
        db.create_project(CreateProjectInput {
            name: name.to_string(),
        })
        .expect("Failed to create project")
    }

    fn lock_gfa(db: &Database, project: &Project, sqft: u64) {
        db.record_citation(
            project.id,
            None,
            NewCitation::new(CiteType::GfaLock, format!("{sqft} sq ft"), sqft),
        )
        .expect("Failed to lock GFA");
    }

    fn select_trade(db: &Database, project: &Project, trade: Trade) {
        db.record_citation(
            project.id,
            None,
            NewCitation::new(CiteType::TradeSelection, trade.label(), trade.as_str()),
        )
        .expect("Failed to select trade");
    }

    fn two_item_template() -> Vec<NewTemplateItem> {
        vec![
            NewTemplateItem {
                name: "Hardwood Flooring".into(),
                category: ItemCategory::Material,
                base_quantity: 100.0,
                unit: "sq ft".into(),
                unit_price: 8.50,
                apply_waste: true,
            },
            NewTemplateItem {
                name: "Flooring Installation".into(),
                category: ItemCategory::Labor,
                base_quantity: 100.0,
                unit: "sq ft".into(),
                unit_price: 4.50,
                apply_waste: false,
            },
        ]
    }

    describe "projects" {
        it "records the name as the first citation" {
            let db = setup_db();
            let project = create_test_project(&db, "Kitchen Reno");

            assert_eq!(project.ledger_version, 1);
            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.len(), 1);
            let name = ledger.latest(CiteType::ProjectName).unwrap();
            assert_eq!(name.answer, "Kitchen Reno");
            assert_eq!(name.seq, 1);
        }

        it "rejects a blank name" {
            let db = setup_db();
            let result = db.create_project(CreateProjectInput {
                name: "   ".into(),
            });
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }

        it "lists every project" {
            let db = setup_db();
            create_test_project(&db, "One");
            create_test_project(&db, "Two");
            assert_eq!(db.list_projects().unwrap().len(), 2);
        }

        it "returns None for an unknown id" {
            let db = setup_db();
            assert!(db.get_project(uuid::Uuid::new_v4()).unwrap().is_none());
        }

        it "deletes the project and its ledger" {
            let db = setup_db();
            let project = create_test_project(&db, "Temp");
            assert!(db.delete_project(project.id).unwrap());
            assert!(matches!(
                db.load_ledger(project.id),
                Err(Error::ProjectNotFound(_))
            ));
        }
    }

    describe "ledger" {
        it "keeps one live PROJECT_NAME with the newer answer" {
            let db = setup_db();
            let project = create_test_project(&db, "Draft");
            db.record_citation(
                project.id,
                None,
                NewCitation::new(CiteType::ProjectName, "Final Name", "Final Name"),
            )
            .unwrap();

            let ledger = db.load_ledger(project.id).unwrap();
            let names: Vec<_> = ledger.all_of(CiteType::ProjectName).collect();
            assert_eq!(names.len(), 1);
            assert_eq!(names[0].answer, "Final Name");

            let refreshed = db.get_project(project.id).unwrap().unwrap();
            assert_eq!(refreshed.name, "Final Name");
        }

        it "keeps superseded entries in the history" {
            let db = setup_db();
            let project = create_test_project(&db, "Draft");
            db.record_citation(
                project.id,
                None,
                NewCitation::new(CiteType::ProjectName, "Second", "Second"),
            )
            .unwrap();

            let history = db.citation_history(project.id).unwrap();
            assert_eq!(history.len(), 2);
            assert!(history[0].superseded_at.is_some());
            assert!(history[1].superseded_at.is_none());
            assert!(history[0].seq < history[1].seq);
        }

        it "accumulates multi-instance citations" {
            let db = setup_db();
            let project = create_test_project(&db, "Photos");
            for name in ["front.jpg", "back.jpg", "roof.jpg"] {
                db.record_document(project.id, uuid::Uuid::new_v4(), RecordDocumentInput {
                    kind: DocumentKind::SitePhoto,
                    file_name: name.into(),
                    size_bytes: 512,
                    message_id: None,
                })
                .unwrap();
            }
            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.all_of(CiteType::SitePhoto).count(), 3);
            assert_eq!(ledger.version(), 4);
        }

        it "rejects a stale expected version" {
            let db = setup_db();
            let project = create_test_project(&db, "Race");

            db.record_citation(
                project.id,
                Some(1),
                NewCitation::new(CiteType::Location, "Toronto", "Toronto"),
            )
            .unwrap();
            let err = db
                .record_citation(
                    project.id,
                    Some(1),
                    NewCitation::new(CiteType::Location, "Ottawa", "Ottawa"),
                )
                .unwrap_err();

            assert!(matches!(err, Error::VersionConflict { expected: 1, actual: 2 }));
            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.latest(CiteType::Location).unwrap().answer, "Toronto");
            assert_eq!(ledger.version(), 2);
        }

        it "round-trips value and metadata" {
            let db = setup_db();
            let project = create_test_project(&db, "Geo");
            let saved = db
                .record_citation(
                    project.id,
                    None,
                    NewCitation::new(CiteType::Location, "1 Main St", "1 Main St")
                        .meta("lat", 43.65)
                        .meta("lng", -79.38),
                )
                .unwrap();

            let loaded = db.get_citation(saved.id).unwrap().unwrap();
            assert_eq!(loaded.metadata["lat"], json!(43.65));
            assert_eq!(loaded.value, json!("1 Main St"));
            assert_eq!(loaded.cite_type, CiteType::Location);
        }

        it "reloads numeric values exactly as recorded" {
            let db = setup_db();
            let project = create_test_project(&db, "Numbers");
            lock_gfa(&db, &project, 1500);
            db.record_citation(
                project.id,
                None,
                NewCitation::new(CiteType::DemolitionPrice, "$2.75 per sq ft", 2.75),
            )
            .unwrap();

            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.latest(CiteType::GfaLock).unwrap().value, json!(1500));
            assert_eq!(ledger.latest(CiteType::DemolitionPrice).unwrap().value, json!(2.75));

            let dna = db.project_dna(project.id).unwrap();
            assert_eq!(dna.gfa_sqft, Some(1500.0));
            assert_eq!(dna.demolition_unit_price, Some(2.75));
        }

        it "refuses types that have their own operation" {
            let db = setup_db();
            let project = create_test_project(&db, "Shortcut");
            for cite_type in [
                CiteType::TemplateLock,
                CiteType::DnaFinalized,
                CiteType::TeamMemberInvite,
                CiteType::BlueprintUpload,
                CiteType::SitePhoto,
                CiteType::Contract,
            ] {
                let result = db.record_citation(
                    project.id,
                    None,
                    NewCitation::new(cite_type, "forced", "forced"),
                );
                assert!(matches!(result, Err(Error::InvalidInput(_))), "{cite_type:?}");
            }
            assert_eq!(db.load_ledger(project.id).unwrap().version(), 1);
        }

        it "refuses malformed typed values" {
            let db = setup_db();
            let project = create_test_project(&db, "Typos");
            let attempts = [
                NewCitation::new(CiteType::GfaLock, "minus", -500),
                NewCitation::new(CiteType::TradeSelection, "Knitting", "knitting"),
                NewCitation::new(CiteType::EndDate, "soon", "next week"),
            ];
            for new in attempts {
                let result = db.record_citation(project.id, None, new);
                assert!(matches!(result, Err(Error::InvalidInput(_))));
            }
            assert!(db.project_dna(project.id).unwrap().gfa_sqft.is_none());
        }

        it "records site condition and price in one commit" {
            let db = setup_db();
            let project = create_test_project(&db, "Tear down");
            lock_gfa(&db, &project, 200);

            let recorded = db
                .set_site_condition(project.id, Some(2), SiteCondition::Demolition, Some(3.0), None)
                .unwrap();
            assert_eq!(recorded.len(), 2);
            assert_eq!(recorded[0].cite_type, CiteType::SiteCondition);
            assert_eq!(recorded[1].cite_type, CiteType::DemolitionPrice);
            assert_eq!(recorded[1].seq, 4);

            let cost = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(cost.demolition_cost, 600.0);
        }

        it "writes nothing when the site condition commit conflicts" {
            let db = setup_db();
            let project = create_test_project(&db, "Tear down");
            lock_gfa(&db, &project, 200);

            let result =
                db.set_site_condition(project.id, Some(1), SiteCondition::Demolition, Some(3.0), None);
            assert!(matches!(result, Err(Error::VersionConflict { .. })));

            let result =
                db.set_site_condition(project.id, None, SiteCondition::Demolition, Some(-1.0), None);
            assert!(matches!(result, Err(Error::InvalidInput(_))));

            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.version(), 2);
            assert!(ledger.latest(CiteType::SiteCondition).is_none());
        }

        it "fails for an unknown project" {
            let db = setup_db();
            let result = db.record_citation(
                uuid::Uuid::new_v4(),
                None,
                NewCitation::new(CiteType::Location, "Nowhere", "Nowhere"),
            );
            assert!(matches!(result, Err(Error::ProjectNotFound(_))));
        }
    }

    describe "template" {
        it "applies the project waste factor to new items" {
            let db = setup_db();
            let project = create_test_project(&db, "Floors");
            let items = db.replace_template(project.id, two_item_template()).unwrap();

            assert_eq!(items[0].quantity, 110.0);
            assert_eq!(items[0].total_price, 935.0);
            assert_eq!(items[1].quantity, 100.0);
        }

        it "computes the documented two-item rollup" {
            let db = setup_db();
            let project = create_test_project(&db, "Floors");
            db.replace_template(project.id, two_item_template()).unwrap();

            let cost = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(cost.material_total, 935.0);
            assert_eq!(cost.labor_total, 450.0);
            assert_eq!(cost.subtotal, 1385.0);
            assert_eq!(cost.tax_amount, 180.05);
            assert_eq!(cost.grand_total, 1565.05);
        }

        it "recomputes totals after each edit" {
            let db = setup_db();
            let project = create_test_project(&db, "Floors");
            let items = db.replace_template(project.id, two_item_template()).unwrap();

            db.update_template_item(
                project.id,
                items[1].id,
                UpdateTemplateItemInput {
                    unit_price: Some(5.0),
                    ..Default::default()
                },
            )
            .unwrap();
            let cost = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(cost.labor_total, 500.0);

            assert!(db.delete_template_item(project.id, items[0].id).unwrap());
            let cost = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(cost.material_total, 0.0);
            assert_eq!(cost.subtotal, 500.0);
        }

        it "re-applies waste idempotently" {
            let db = setup_db();
            let project = create_test_project(&db, "Floors");
            db.replace_template(project.id, two_item_template()).unwrap();

            let first = db.apply_waste_percent(project.id, 15.0).unwrap();
            let second = db.apply_waste_percent(project.id, 15.0).unwrap();
            assert_eq!(first, second);
            assert_eq!(first[0].quantity, 115.0);
        }

        it "adds demolition cost from the site condition" {
            let db = setup_db();
            let project = create_test_project(&db, "Tear out");
            lock_gfa(&db, &project, 100);
            db.record_citation(
                project.id,
                None,
                NewCitation::new(CiteType::SiteCondition, "Demolition required", "demolition"),
            )
            .unwrap();
            db.record_citation(
                project.id,
                None,
                NewCitation::new(CiteType::DemolitionPrice, "$3.00 / sq ft", 3.0),
            )
            .unwrap();
            db.replace_template(project.id, two_item_template()).unwrap();

            let cost = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(cost.demolition_cost, 300.0);
            assert_eq!(cost.subtotal, 1685.0);
        }

        it "locks a snapshot whose value is the pre-tax net total" {
            let db = setup_db();
            let project = create_test_project(&db, "Floors");
            db.replace_template(project.id, two_item_template()).unwrap();

            let lock = db
                .lock_template(project.id, None, &Pricing::default(), None)
                .unwrap();
            assert_eq!(lock.citation.cite_type, CiteType::TemplateLock);
            assert_eq!(lock.citation.value, json!(1385.0));
            assert_eq!(lock.citation.metadata["cost"]["grand_total"], json!(1565.05));
            assert_eq!(lock.document.kind, DocumentKind::TemplateSnapshot);
            assert_eq!(
                lock.document.storage_path,
                format!(
                    "{}/{}-template-lock-{}.json",
                    project.id, lock.document.id, lock.citation.seq
                )
            );

            let docs = db.list_documents(project.id).unwrap();
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].citation_id, Some(lock.citation.id));
        }

        it "refuses to lock an empty template" {
            let db = setup_db();
            let project = create_test_project(&db, "Empty");
            let result = db.lock_template(project.id, None, &Pricing::default(), None);
            assert!(matches!(result, Err(Error::InvalidInput(_))));
            assert_eq!(db.load_ledger(project.id).unwrap().version(), 1);
        }

        it "rejects negative quantities" {
            let db = setup_db();
            let project = create_test_project(&db, "Bad");
            let mut items = two_item_template();
            items[0].base_quantity = -1.0;
            assert!(matches!(
                db.replace_template(project.id, items),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    describe "team and documents" {
        it "records an invite citation per member" {
            let db = setup_db();
            let project = create_test_project(&db, "Crew");
            for email in ["ana@example.com", "ben@example.com"] {
                db.invite_member(project.id, InviteMemberInput {
                    email: email.into(),
                    name: None,
                    role: TeamRole::Worker,
                    message_id: None,
                })
                .unwrap();
            }

            let team = db.list_team(project.id).unwrap();
            assert_eq!(team.len(), 2);
            assert!(team.iter().all(|m| m.status == InvitationStatus::Pending));
            let ledger = db.load_ledger(project.id).unwrap();
            assert_eq!(ledger.all_of(CiteType::TeamMemberInvite).count(), 2);
        }

        it "rejects a duplicate invite" {
            let db = setup_db();
            let project = create_test_project(&db, "Crew");
            let input = InviteMemberInput {
                email: "Ana@Example.com".into(),
                name: Some("Ana".into()),
                role: TeamRole::Foreman,
                message_id: None,
            };
            db.invite_member(project.id, input.clone()).unwrap();
            assert!(matches!(
                db.invite_member(project.id, input),
                Err(Error::InvalidInput(_))
            ));
        }

        it "updates member status" {
            let db = setup_db();
            let project = create_test_project(&db, "Crew");
            let member = db.invite_member(project.id, InviteMemberInput {
                email: "cy@example.com".into(),
                name: None,
                role: TeamRole::Inspector,
                message_id: None,
            })
            .unwrap();

            let updated = db
                .set_member_status(project.id, member.id, InvitationStatus::Accepted)
                .unwrap();
            assert_eq!(updated.status, InvitationStatus::Accepted);
        }

        it "records uploads under the project prefix" {
            let db = setup_db();
            let project = create_test_project(&db, "Plans");
            let document_id = uuid::Uuid::new_v4();
            let (doc, citation) = db
                .record_document(project.id, document_id, RecordDocumentInput {
                    kind: DocumentKind::Blueprint,
                    file_name: "floor-plan.pdf".into(),
                    size_bytes: 2048,
                    message_id: None,
                })
                .unwrap();

            assert_eq!(doc.id, document_id);
            assert_eq!(
                doc.storage_path,
                format!("{}/{}-floor-plan.pdf", project.id, document_id)
            );
            let citation = citation.unwrap();
            assert_eq!(citation.cite_type, CiteType::BlueprintUpload);
            assert_eq!(citation.value, json!(doc.storage_path));
            assert_eq!(doc.citation_id, Some(citation.id));
        }

        it "gives same-named uploads distinct paths" {
            let db = setup_db();
            let project = create_test_project(&db, "Plans");
            let mut paths = Vec::new();
            for _ in 0..2 {
                let (doc, _) = db
                    .record_document(project.id, uuid::Uuid::new_v4(), RecordDocumentInput {
                        kind: DocumentKind::SitePhoto,
                        file_name: "photo.jpg".into(),
                        size_bytes: 10,
                        message_id: None,
                    })
                    .unwrap();
                paths.push(doc.storage_path);
            }
            assert_ne!(paths[0], paths[1]);
            assert_eq!(db.list_documents(project.id).unwrap().len(), 2);
        }

        it "rejects a size that does not fit the column" {
            let db = setup_db();
            let project = create_test_project(&db, "Huge");
            let result = db.record_document(project.id, uuid::Uuid::new_v4(), RecordDocumentInput {
                kind: DocumentKind::Contract,
                file_name: "huge.pdf".into(),
                size_bytes: u64::MAX,
                message_id: None,
            });
            assert!(matches!(result, Err(Error::InvalidInput(_))));
            assert!(db.list_documents(project.id).unwrap().is_empty());
        }

        it "rejects path traversal in file names" {
            let db = setup_db();
            let project = create_test_project(&db, "Plans");
            let result = db.record_document(project.id, uuid::Uuid::new_v4(), RecordDocumentInput {
                kind: DocumentKind::Contract,
                file_name: "../secrets.pdf".into(),
                size_bytes: 1,
                message_id: None,
            });
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }
    }

    describe "traceability" {
        it "links a citation back to its chat message" {
            let db = setup_db();
            let project = create_test_project(&db, "Chatty");
            let message = db
                .post_message(project.id, PostMessageInput {
                    role: MessageRole::User,
                    content: "It's about 140 square metres".into(),
                })
                .unwrap();
            let citation = db
                .record_citation(
                    project.id,
                    None,
                    NewCitation::new(CiteType::GfaLock, "1507 sq ft", 1507).from_message(message.id),
                )
                .unwrap();

            let source = db.citation_source(citation.id).unwrap().unwrap();
            assert_eq!(source.id, message.id);
            assert_eq!(source.content, "It's about 140 square metres");
        }

        it "refuses a message from another project" {
            let db = setup_db();
            let ours = create_test_project(&db, "Ours");
            let theirs = create_test_project(&db, "Theirs");
            let foreign = db
                .post_message(theirs.id, PostMessageInput {
                    role: MessageRole::User,
                    content: "We're in Calgary".into(),
                })
                .unwrap();

            let result = db.record_citation(
                ours.id,
                None,
                NewCitation::new(CiteType::Location, "Calgary", "Calgary").from_message(foreign.id),
            );
            assert!(matches!(result, Err(Error::InvalidInput(_))));
            assert!(db.load_ledger(ours.id).unwrap().latest(CiteType::Location).is_none());
        }

        it "returns None when a citation has no message" {
            let db = setup_db();
            let project = create_test_project(&db, "Quiet");
            let ledger = db.load_ledger(project.id).unwrap();
            let first = ledger.entries()[0].id;
            assert!(db.citation_source(first).unwrap().is_none());
        }
    }

    describe "dna" {
        it "derives a schedule from the timeline" {
            let db = setup_db();
            let project = create_test_project(&db, "Sched");
            db.replace_template(project.id, catalog_template(Trade::Flooring, 500.0))
                .unwrap();
            db.record_citation(
                project.id,
                None,
                NewCitation::new(
                    CiteType::Timeline,
                    "Mar 2 to Mar 13",
                    json!({"start": "2026-03-02", "end": "2026-03-13"}),
                ),
            )
            .unwrap();

            let tasks = db.schedule(project.id).unwrap();
            assert_eq!(tasks.len(), 3);
            assert_eq!(tasks[0].phase, Phase::Preparation);
            let assigned: usize = tasks.iter().map(|t| t.item_ids.len()).sum();
            assert_eq!(assigned, 6);
        }

        it "requires a timeline for the schedule" {
            let db = setup_db();
            let project = create_test_project(&db, "Sched");
            assert!(matches!(db.schedule(project.id), Err(Error::Incomplete(_))));
        }

        it "lists what is missing before finalizing" {
            let db = setup_db();
            let project = create_test_project(&db, "Early");
            lock_gfa(&db, &project, 900);

            match db.finalize_dna(project.id, None) {
                Err(Error::Incomplete(missing)) => {
                    assert_eq!(missing, vec![CiteType::TradeSelection, CiteType::TemplateLock]);
                }
                other => panic!("expected Incomplete, got {other:?}"),
            }
        }

        it "finalizes once area, trade and template are locked" {
            let db = setup_db();
            let project = create_test_project(&db, "Ready");
            lock_gfa(&db, &project, 100);
            select_trade(&db, &project, Trade::Flooring);
            db.replace_template(project.id, two_item_template()).unwrap();
            db.lock_template(project.id, None, &Pricing::default(), None)
                .unwrap();

            let citation = db.finalize_dna(project.id, None).unwrap();
            assert_eq!(citation.cite_type, CiteType::DnaFinalized);
            assert_eq!(citation.value, json!(1385.0));

            let dna = db.project_dna(project.id).unwrap();
            assert!(dna.finalized);
            assert_eq!(dna.trade, Some(Trade::Flooring));
            assert_eq!(dna.template_net_total, Some(1385.0));
        }

        it "finalizes with the locked cost after later edits" {
            let db = setup_db();
            let project = create_test_project(&db, "Drift");
            lock_gfa(&db, &project, 100);
            select_trade(&db, &project, Trade::Flooring);
            let items = db.replace_template(project.id, two_item_template()).unwrap();
            let lock = db
                .lock_template(project.id, None, &Pricing::default(), None)
                .unwrap();

            db.update_template_item(
                project.id,
                items[1].id,
                UpdateTemplateItemInput {
                    unit_price: Some(9.0),
                    ..Default::default()
                },
            )
            .unwrap();
            let live = db.cost_summary(project.id, &Pricing::default()).unwrap();
            assert_eq!(live.net_total, 1835.0);

            let citation = db.finalize_dna(project.id, None).unwrap();
            assert_eq!(citation.value, lock.citation.value);
            assert_eq!(citation.value, json!(1385.0));
            assert_eq!(citation.metadata["cost"]["grand_total"], json!(1565.05));
        }
    }
}
