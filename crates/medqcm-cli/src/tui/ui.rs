//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use medqcm_core::exam::{Outcome, Phase, MAX_TEST_QUESTIONS};
use medqcm_core::models::{Module, Question};
use medqcm_core::review::{option_appearance, OptionAppearance};

use super::app::{App, InputMode, Screen, Tab, TreeRow};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    // Vertical layout with the status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    match app.screen {
        Screen::Dashboard => draw_dashboard(frame, app, outer_chunks[0]),
        Screen::Module => draw_module_screen(frame, app, outer_chunks[0]),
    }

    // Generation indicator in the top-right corner
    draw_generation_indicator(frame, app);

    match app.input_mode {
        InputMode::Normal => draw_status_bar(frame, app, outer_chunks[1]),
        InputMode::Command => draw_command_input(frame, app, outer_chunks[1]),
    }

    if app.show_help {
        draw_help_overlay(frame, app);
    }
}

// ==================== Dashboard ====================

/// Draw the dashboard: curriculum tree on the left, module summary on the
/// right
fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_tree_pane(frame, app, pane_chunks[0]);
    draw_summary_pane(frame, app, pane_chunks[1]);
}

/// Draw the year/semester/module tree (left)
fn draw_tree_pane(frame: &mut Frame, app: &App, area: Rect) {
    let store = app.controller.state();

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let label = match row {
                TreeRow::Year { year_id } => {
                    let name = store
                        .year(year_id)
                        .map_or(year_id.as_str(), |y| y.name.as_str());
                    let marker = if app.expanded_years.contains(year_id) {
                        "▼"
                    } else {
                        "▶"
                    };
                    format!("{} {}", marker, name)
                }
                TreeRow::Semester {
                    year_id,
                    semester_id,
                } => {
                    let name = store
                        .year(year_id)
                        .and_then(|y| y.semesters.iter().find(|s| s.id == *semester_id))
                        .map_or(semester_id.as_str(), |s| s.name.as_str());
                    let marker = if app.expanded_semesters.contains(semester_id) {
                        "▼"
                    } else {
                        "▶"
                    };
                    format!("  {} {}", marker, name)
                }
                TreeRow::Module { module_id, .. } => {
                    match medqcm_core::bank::find_module(store, module_id) {
                        Some(module) => format!(
                            "    {} ({} QCM)",
                            module.name,
                            module.questions.len()
                        ),
                        None => format!("    {}", module_id),
                    }
                }
            };
            ListItem::new(label)
        })
        .collect();

    let block = Block::default()
        .title(" Programme ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    if !app.rows.is_empty() {
        state.select(Some(app.row_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the summary of the highlighted module (right)
fn draw_summary_pane(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Détail ").borders(Borders::ALL);

    let module = match app.current_row() {
        Some(TreeRow::Module { module_id, .. }) => {
            medqcm_core::bank::find_module(app.controller.state(), module_id)
        }
        _ => None,
    };

    let content = if let Some(module) = module {
        module_summary_lines(module)
    } else {
        vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Sélectionnez un module pour voir le détail",
                Style::default().add_modifier(Modifier::DIM),
            )]),
        ]
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn module_summary_lines(module: &Module) -> Vec<Line<'_>> {
    let ai_count = module
        .questions
        .iter()
        .filter(|q| q.is_ai_generated())
        .count();

    let mut lines = vec![
        Line::from(vec![Span::styled(
            module.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    if let Some(description) = &module.description {
        lines.push(Line::from(description.as_str()));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(format!(
        "Questions: {} ({} IA)",
        module.questions.len(),
        ai_count
    )));
    lines.push(Line::from(format!(
        "Éligibles au test: {}",
        module.eligible_questions().len()
    )));
    lines.push(Line::from(format!("Ressources PDF: {}", module.pdfs.len())));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![Span::styled(
        "Entrée pour ouvrir",
        Style::default().add_modifier(Modifier::DIM),
    )]));

    lines
}

// ==================== Module screen ====================

/// Draw the module screen: header with tabs, then the active tab's content
fn draw_module_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let module_name = app
        .current_module()
        .map_or_else(|| "Module".to_string(), |m| m.name.clone());

    let tab_index = match app.tab {
        Tab::Review => 0,
        Tab::Exam => 1,
        Tab::Resources => 2,
    };

    let tabs = Tabs::new(vec!["Révision", "Test", "Ressources"])
        .block(
            Block::default()
                .title(format!(" {} ", module_name))
                .borders(Borders::ALL),
        )
        .select(tab_index)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        );

    frame.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Review => draw_review_tab(frame, app, chunks[1]),
        Tab::Exam => draw_exam_tab(frame, app, chunks[1]),
        Tab::Resources => draw_resources_tab(frame, app, chunks[1]),
    }
}

// ==================== Review tab ====================

fn draw_review_tab(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " Révision ({}/{}) ",
        if app.review_cards.is_empty() {
            0
        } else {
            app.review_index + 1
        },
        app.review_cards.len()
    );
    let block = Block::default().title(title).borders(Borders::ALL);

    let Some(card) = app.current_review_card() else {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Aucune question. :qcm pour en ajouter, g pour en générer.",
                Style::default().add_modifier(Modifier::DIM),
            )]),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = question_header_lines(card.question());

    for (i, option) in card.question().options.iter().enumerate() {
        lines.push(option_line(i, option, card.appearance(i, false)));
    }

    lines.push(Line::from(""));
    if card.is_locked() {
        let verdict = if card.is_correct() {
            Span::styled("Bonne réponse", Style::default().fg(Color::Green))
        } else {
            Span::styled("Mauvaise réponse", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![verdict]));

        if card.explanation_visible() {
            if let Some(explanation) = &card.question().explanation {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![Span::styled(
                    "Explication:",
                    Style::default().add_modifier(Modifier::BOLD),
                )]));
                lines.push(Line::from(explanation.as_str()));
            }
        } else if card.question().explanation.is_some() {
            lines.push(Line::from(vec![Span::styled(
                "e: afficher l'explication",
                Style::default().add_modifier(Modifier::DIM),
            )]));
        }
    } else if card.question().correct.len() > 1 {
        lines.push(Line::from(vec![Span::styled(
            "Plusieurs réponses. 1-9 pour cocher, Entrée pour valider.",
            Style::default().add_modifier(Modifier::DIM),
        )]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

// ==================== Exam tab ====================

fn draw_exam_tab(frame: &mut Frame, app: &App, area: Rect) {
    match app.exam.phase() {
        Phase::Intro => draw_exam_intro(frame, app, area),
        Phase::Active => draw_exam_active(frame, app, area),
        Phase::Result => draw_exam_result(frame, app, area),
    }
}

fn draw_exam_intro(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Test ").borders(Borders::ALL);

    let eligible = app
        .current_module()
        .map_or(0, |m| m.eligible_questions().len());

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "Mode test",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(format!(
            "Questions éligibles: {} (maximum {} par session)",
            eligible, MAX_TEST_QUESTIONS
        )),
        Line::from("Les questions générées par IA sont exclues du test."),
        Line::from("Aucun retour n'est affiché avant la fin de la session."),
        Line::from(""),
    ];

    if eligible > 0 {
        lines.push(Line::from(vec![Span::styled(
            "s: commencer le test",
            Style::default().fg(Color::Green),
        )]));
    } else {
        lines.push(Line::from(vec![Span::styled(
            "Aucune question éligible",
            Style::default().add_modifier(Modifier::DIM),
        )]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn draw_exam_active(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " Test ({}/{}) ",
        app.exam.current_index() + 1,
        app.exam.questions().len()
    );
    let block = Block::default().title(title).borders(Borders::ALL);

    let Some(question) = app.exam.current_question() else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let empty = std::collections::BTreeSet::new();
    let selected = app.exam.answer_for(&question.id).unwrap_or(&empty);

    let mut lines = question_header_lines(question);

    // Feedback is suppressed while the session is active
    for (i, option) in question.options.iter().enumerate() {
        lines.push(option_line(
            i,
            option,
            option_appearance(question, selected, i, false),
        ));
    }

    lines.push(Line::from(""));
    let last = app.exam.current_index() + 1 == app.exam.questions().len();
    let hint = if last {
        "1-9: cocher  p: précédent  Entrée: terminer le test"
    } else {
        "1-9: cocher  p: précédent  Entrée: suivant"
    };
    lines.push(Line::from(vec![Span::styled(
        hint,
        Style::default().add_modifier(Modifier::DIM),
    )]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn draw_exam_result(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Résultat ").borders(Borders::ALL);

    let score = app.exam.score();
    let score_color = if score.percent >= 50 {
        Color::Green
    } else {
        Color::Red
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            format!(
                "Score: {}/{} ({}%)",
                score.correct, score.total, score.percent
            ),
            Style::default().fg(score_color).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    for (i, question) in app.exam.questions().iter().enumerate() {
        let (symbol, style) = match app.exam.outcome(question) {
            Outcome::Correct => ("✓", Style::default().fg(Color::Green)),
            Outcome::Incorrect => ("✗", Style::default().fg(Color::Red)),
            Outcome::Unanswered => ("—", Style::default().add_modifier(Modifier::DIM)),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", symbol), style),
            Span::raw(format!("{}. {}", i + 1, question.text)),
        ]));
        let correct: Vec<String> = question
            .correct
            .iter()
            .filter_map(|&idx| question.options.get(idx))
            .map(|o| o.to_string())
            .collect();
        lines.push(Line::from(vec![Span::styled(
            format!("   Réponse: {}", correct.join(", ")),
            Style::default().add_modifier(Modifier::DIM),
        )]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![Span::styled(
        "r: recommencer",
        Style::default().add_modifier(Modifier::DIM),
    )]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

// ==================== Resources tab ====================

fn draw_resources_tab(frame: &mut Frame, app: &App, area: Rect) {
    let pdfs = app.current_module().map(|m| m.pdfs.clone()).unwrap_or_default();

    let items: Vec<ListItem> = pdfs
        .iter()
        .map(|pdf| {
            let name_line = Line::from(pdf.name.clone());
            let url_line = Line::from(vec![Span::styled(
                pdf.url.clone(),
                Style::default().add_modifier(Modifier::DIM),
            )]);
            ListItem::new(vec![name_line, url_line])
        })
        .collect();

    let title = format!(" Ressources ({}) ", pdfs.len());
    let block = Block::default().title(title).borders(Borders::ALL);

    if items.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Aucune ressource. :pdf <nom> | <url> pour en ajouter.",
                Style::default().add_modifier(Modifier::DIM),
            )]),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    state.select(Some(app.pdf_index));

    frame.render_stateful_widget(list, area, &mut state);
}

// ==================== Shared pieces ====================

fn question_header_lines(question: &Question) -> Vec<Line<'_>> {
    let mut lines = vec![Line::from(vec![Span::styled(
        question.text.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )])];
    if question.is_ai_generated() {
        lines.push(Line::from(vec![Span::styled(
            "généré par IA",
            Style::default().add_modifier(Modifier::DIM),
        )]));
    }
    lines.push(Line::from(""));
    lines
}

/// One option row, styled by its render class
fn option_line(index: usize, option: &str, appearance: OptionAppearance) -> Line<'_> {
    let letter = (b'a' + index as u8) as char;
    let (prefix, style) = match appearance {
        OptionAppearance::Neutral => ("  ", Style::default()),
        OptionAppearance::Selected => ("▸ ", Style::default().add_modifier(Modifier::REVERSED)),
        OptionAppearance::Correct => ("✓ ", Style::default().fg(Color::Green)),
        OptionAppearance::Incorrect => ("✗ ", Style::default().fg(Color::Red)),
        OptionAppearance::Dimmed => ("  ", Style::default().add_modifier(Modifier::DIM)),
    };
    Line::from(vec![
        Span::styled(prefix, style),
        Span::styled(format!("{}) {}", letter, option), style),
    ])
}

// ==================== Chrome ====================

/// Draw the generation indicator in the top-right corner
fn draw_generation_indicator(frame: &mut Frame, app: &App) {
    if !app.is_generating {
        return;
    }
    let area = frame.area();
    if area.width < 5 {
        return;
    }

    let indicator = Paragraph::new(Span::styled("↻", Style::default().fg(Color::Yellow)));
    let indicator_area = Rect::new(area.width - 2, 0, 1, 1);
    frame.render_widget(indicator, indicator_area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        match app.screen {
            Screen::Dashboard => {
                "j/k: naviguer  Entrée: ouvrir  ?: aide  q: quitter".to_string()
            }
            Screen::Module => {
                "Tab: onglets  g: générer  :: commande  Échap: retour  ?: aide".to_string()
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw command input at the bottom
fn draw_command_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = ":";

    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        Span::raw(app.command_input.as_str()),
    ]);

    let paragraph = Paragraph::new(line);
    frame.render_widget(paragraph, area);

    let cursor_x = area.x + prefix.len() as u16 + app.command_cursor as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 22.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(ratatui::widgets::Clear, popup_area);

    let mut help_text = vec![
        Line::from(vec![Span::styled(
            "Raccourcis clavier",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Monter/descendre"),
        Line::from("  Entrée      Ouvrir / déplier"),
        Line::from("  Tab, h/l    Changer d'onglet"),
        Line::from("  Échap, b    Retour au tableau de bord"),
        Line::from(""),
    ];

    if app.screen == Screen::Module {
        help_text.extend([
            Line::from("Module:"),
            Line::from("  1-9         Choisir/cocher une option"),
            Line::from("  Entrée      Valider (multi) / question suivante"),
            Line::from("  e           Afficher l'explication"),
            Line::from("  s           Commencer le test"),
            Line::from("  p           Question précédente (test)"),
            Line::from("  r           Recommencer (résultat)"),
            Line::from("  g           Générer des questions IA"),
            Line::from("  o           Ouvrir le PDF sélectionné"),
            Line::from(""),
            Line::from("Commandes:"),
            Line::from("  :pdf <nom> | <url>"),
            Line::from("  :qcm <énoncé> | <opt> | <opt> | correct=a,c"),
            Line::from(""),
        ]);
    }

    help_text.extend([
        Line::from("  q           Quitter"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Appuyez sur une touche pour fermer",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ]);

    let block = Block::default()
        .title(" Aide ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}
