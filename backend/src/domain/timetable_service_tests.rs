//! Tests for the timetable service.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::grid::{Cell, GridAddress};
use crate::domain::ports::{
    ClassroomChanges, MockAccessPolicy, MockOrganisationRepository, MockTeacherRepository,
};
use crate::domain::{
    ClassroomDraft, ErrorCode, MembershipPermissions, NewTeacher, TeacherMembership,
};

const ADMIN: TeacherId = TeacherId::new(1);
const MATH_TEACHER: TeacherId = TeacherId::new(2);
const OUTSIDER: TeacherId = TeacherId::new(3);

type Service =
    TimetableService<MockOrganisationRepository, MockTeacherRepository, MockAccessPolicy>;

fn org_id() -> OrganisationId {
    OrganisationId::new("school").expect("fixture organisation id")
}

fn classroom_id() -> ClassroomId {
    ClassroomId::new("7A").expect("fixture classroom id")
}

fn member(id: TeacherId, subjects: &[&str]) -> Teacher {
    let mut teacher = NewTeacher::try_new(format!("Teacher {id}"), format!("t{id}@school.test"))
        .expect("fixture teacher")
        .into_teacher(id);
    let membership = TeacherMembership::new(
        org_id(),
        subjects.iter().copied(),
        ["7A"],
        MembershipPermissions::default(),
        DateTime::<Utc>::UNIX_EPOCH,
    )
    .expect("fixture membership");
    teacher.add_membership(membership).expect("first membership");
    teacher
}

fn organisation_with_shape(days: usize, periods: usize) -> Organisation {
    let shape = GridShape::new(days, periods).expect("fixture shape");
    let mut organisation = Organisation::new(org_id(), "School", ADMIN, shape);
    let mut draft = ClassroomDraft::named(classroom_id(), "Class 7A");
    draft.assigned_teachers.insert(MATH_TEACHER);
    organisation.add_classroom(draft).expect("classroom added");
    organisation
}

#[fixture]
fn organisation() -> Organisation {
    organisation_with_shape(5, 6)
}

fn allow_all() -> MockAccessPolicy {
    let mut access = MockAccessPolicy::new();
    access
        .expect_has_permission()
        .returning(|_, _, _| Ok(true));
    access
}

fn deny_all() -> MockAccessPolicy {
    let mut access = MockAccessPolicy::new();
    access
        .expect_has_permission()
        .returning(|_, _, _| Ok(false));
    access
}

fn joined_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn make_service(
    organisations: MockOrganisationRepository,
    teachers: MockTeacherRepository,
    access: MockAccessPolicy,
) -> Service {
    TimetableService::new(
        Arc::new(organisations),
        Arc::new(teachers),
        Arc::new(access),
        Arc::new(FixtureClock {
            utc_now: joined_timestamp(),
        }),
    )
}

fn teachers_returning(found: Vec<Teacher>) -> MockTeacherRepository {
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find_many()
        .returning(move |_| Ok(found.clone()));
    teachers
}

fn set_cell_request(day: usize, period: usize, cell: Cell) -> SetGridCellRequest {
    SetGridCellRequest {
        actor: ADMIN,
        organisation_id: org_id(),
        classroom_id: classroom_id(),
        address: GridAddress::new(day, period),
        cell,
        expected_revision: None,
    }
}

fn detail_field(error: &Error) -> Option<&str> {
    error
        .details()
        .and_then(|details| details.get("field"))
        .and_then(|field| field.as_str())
}

#[rstest]
#[tokio::test]
async fn set_grid_cell_writes_the_flattened_slot(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(organisation)));
    organisations
        .expect_save()
        .withf(|saved, expected| {
            let cell = &saved.classroom(&classroom_id()).expect("classroom").grid.cells()[8];
            *expected == Some(1) && saved.revision == 2 && cell.has_teacher(MATH_TEACHER)
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let teachers = teachers_returning(vec![member(MATH_TEACHER, &["Math"])]);

    let service = make_service(organisations, teachers, allow_all());
    let classroom = service
        .set_grid_cell(set_cell_request(1, 2, Cell::new([MATH_TEACHER], ["Math"])))
        .await
        .expect("write succeeds");

    let written = &classroom.grid.cells()[8];
    assert_eq!(written, &Cell::new([MATH_TEACHER], ["Math"]));
    assert_eq!(classroom.grid.filled_count(), 1);
}

#[rstest]
#[tokio::test]
async fn set_grid_cell_rejects_unteachable_subject_before_loading() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_find().times(0);
    organisations.expect_save().times(0);
    let teachers = teachers_returning(vec![member(MATH_TEACHER, &["Math"])]);

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .set_grid_cell(set_cell_request(1, 2, Cell::new([MATH_TEACHER], ["Physics"])))
        .await
        .expect_err("physics is not taught");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.detail_code(), Some("unteachable_subject"));
}

#[rstest]
#[tokio::test]
async fn set_grid_cell_rejects_non_members() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_save().times(0);
    let teachers = teachers_returning(Vec::new());

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .set_grid_cell(set_cell_request(0, 0, Cell::new([OUTSIDER], ["Math"])))
        .await
        .expect_err("unknown teacher");

    assert_eq!(error.detail_code(), Some("unknown_teacher"));
}

#[rstest]
#[tokio::test]
async fn set_grid_cell_rejects_teachers_outside_the_roster(mut organisation: Organisation) {
    organisation.teachers.insert(OUTSIDER);
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);
    let teachers = teachers_returning(vec![member(OUTSIDER, &["Math"])]);

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .set_grid_cell(set_cell_request(0, 0, Cell::new([OUTSIDER], ["Math"])))
        .await
        .expect_err("not rostered");

    assert_eq!(error.detail_code(), Some("teacher_not_in_roster"));
}

#[rstest]
#[case(5, 0, "day")]
#[case(1, 6, "period")]
#[tokio::test]
async fn set_grid_cell_reports_out_of_range_fields(
    organisation: Organisation,
    #[case] day: usize,
    #[case] period: usize,
    #[case] field: &str,
) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .set_grid_cell(set_cell_request(day, period, Cell::empty()))
        .await
        .expect_err("outside the grid");

    assert_eq!(error.detail_code(), Some("out_of_range"));
    assert_eq!(detail_field(&error), Some(field));
}

#[rstest]
#[tokio::test]
async fn denied_actors_are_rejected_before_any_read() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_find().times(0);
    let mut teachers = MockTeacherRepository::new();
    teachers.expect_find_many().times(0);

    let service = make_service(organisations, teachers, deny_all());
    let error = service
        .set_grid_cell(set_cell_request(0, 0, Cell::empty()))
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn lost_revision_race_is_retried_from_a_fresh_read(organisation: Organisation) {
    let mut raced = organisation.clone();
    raced.revision = 2;
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(organisation)));
    organisations
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(raced)));
    organisations
        .expect_save()
        .withf(|_, expected| *expected == Some(1))
        .times(1)
        .return_once(|_, _| Err(OrganisationRepositoryError::revision_mismatch(1_u32, 2_u32)));
    organisations
        .expect_save()
        .withf(|saved, expected| *expected == Some(2) && saved.revision == 3)
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    service
        .set_grid_cell(set_cell_request(0, 0, Cell::empty()))
        .await
        .expect("second attempt succeeds");
}

#[rstest]
#[tokio::test]
async fn exhausted_retries_surface_a_conflict(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(2)
        .returning(move |_| Ok(Some(organisation.clone())));
    organisations
        .expect_save()
        .times(2)
        .returning(|_, _| Err(OrganisationRepositoryError::revision_mismatch(1_u32, 7_u32)));

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all())
        .with_max_write_attempts(2);
    let error = service
        .set_grid_cell(set_cell_request(0, 0, Cell::empty()))
        .await
        .expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("revision_mismatch"));
}

#[rstest]
#[tokio::test]
async fn stale_expected_revision_fails_without_writing(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let mut request = set_cell_request(0, 0, Cell::empty());
    request.expected_revision = Some(4);
    let error = service.set_grid_cell(request).await.expect_err("stale");

    assert_eq!(error.code(), ErrorCode::Conflict);
    let details = error.details().expect("details");
    assert_eq!(details["expectedRevision"], 4);
    assert_eq!(details["actualRevision"], 1);
}

#[rstest]
#[tokio::test]
async fn missing_organisation_is_not_found() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_find().return_once(|_| Ok(None));

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .get_organisation(ADMIN, &org_id())
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn shrinking_the_shape_reports_dropped_cells() {
    let mut organisation = organisation_with_shape(5, 8);
    for day in 0..5 {
        organisation
            .set_cell(
                &classroom_id(),
                GridAddress::new(day, 7),
                Cell::new([MATH_TEACHER], ["Math"]),
            )
            .expect("fixture cell");
    }
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations
        .expect_save()
        .withf(|saved, _| saved.is_consistent() && saved.shape().slot_count() == 30)
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let response = service
        .update_organisation_shape(UpdateShapeRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            days_count: 5,
            period_count: 6,
            expected_revision: None,
        })
        .await
        .expect("reshape succeeds");

    assert_eq!(response.dropped_cells, 5);
    let classroom = response
        .organisation
        .classroom(&classroom_id())
        .expect("classroom");
    assert_eq!(classroom.grid.len(), 30);
}

#[rstest]
#[tokio::test]
async fn invalid_shapes_are_rejected_before_loading() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_find().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .update_organisation_shape(UpdateShapeRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            days_count: 0,
            period_count: 6,
            expected_revision: None,
        })
        .await
        .expect_err("zero days");

    assert_eq!(error.detail_code(), Some("invalid_shape"));
    assert_eq!(detail_field(&error), Some("daysCount"));
}

#[rstest]
#[tokio::test]
async fn create_organisation_uses_default_shape() {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_save()
        .withf(|saved, expected| {
            expected.is_none() && saved.shape().slot_count() == 40 && saved.admin_ref == ADMIN
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(ADMIN, &["Math"]))));

    let service = make_service(organisations, teachers, MockAccessPolicy::new());
    let organisation = service
        .create_organisation(CreateOrganisationRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            name: "  Hill School ".to_owned(),
            days_count: None,
            period_count: None,
        })
        .await
        .expect("created");

    assert_eq!(organisation.name, "Hill School");
    assert_eq!(organisation.revision, 1);
    assert!(organisation.classrooms().is_empty());
}

#[rstest]
#[tokio::test]
async fn duplicate_organisation_is_a_conflict() {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_save()
        .return_once(|_, _| Err(OrganisationRepositoryError::duplicate("school")));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(ADMIN, &["Math"]))));

    let service = make_service(organisations, teachers, MockAccessPolicy::new());
    let error = service
        .create_organisation(CreateOrganisationRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            name: "School".to_owned(),
            days_count: Some(5),
            period_count: Some(6),
        })
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("duplicate_organisation"));
}

#[rstest]
#[tokio::test]
async fn duplicate_classroom_is_a_conflict(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .create_classroom(CreateClassroomRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            classroom: ClassroomDraft::named(classroom_id(), "Again"),
            expected_revision: None,
        })
        .await
        .expect_err("duplicate");

    assert_eq!(error.detail_code(), Some("duplicate_classroom"));
}

#[rstest]
#[tokio::test]
async fn create_classroom_initialises_an_empty_grid(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().return_once(|_, _| Ok(()));
    let teachers = teachers_returning(vec![member(MATH_TEACHER, &["Math"])]);

    let service = make_service(organisations, teachers, allow_all());
    let mut draft = ClassroomDraft::named(ClassroomId::new("8B").expect("id"), " Class 8B ");
    draft.assigned_teacher = Some(MATH_TEACHER);
    let classroom = service
        .create_classroom(CreateClassroomRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            classroom: draft,
            expected_revision: None,
        })
        .await
        .expect("created");

    assert_eq!(classroom.classroom_name, "Class 8B");
    assert_eq!(classroom.grid.len(), 30);
    assert_eq!(classroom.grid.filled_count(), 0);
}

#[rstest]
#[tokio::test]
async fn bulk_grid_replace_checks_the_length(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .update_classroom(UpdateClassroomRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            classroom_id: classroom_id(),
            changes: ClassroomChanges {
                grid: Some(vec![Cell::empty(); 29]),
                ..ClassroomChanges::default()
            },
            expected_revision: None,
        })
        .await
        .expect_err("short grid");

    assert_eq!(error.detail_code(), Some("shape_mismatch"));
}

#[rstest]
#[tokio::test]
async fn shrinking_the_roster_under_a_placed_teacher_is_rejected(mut organisation: Organisation) {
    organisation
        .set_cell(
            &classroom_id(),
            GridAddress::new(0, 0),
            Cell::new([MATH_TEACHER], ["Math"]),
        )
        .expect("fixture cell");
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);

    let service = make_service(organisations, MockTeacherRepository::new(), allow_all());
    let error = service
        .update_classroom(UpdateClassroomRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            classroom_id: classroom_id(),
            changes: ClassroomChanges {
                assigned_teachers: Some(BTreeSet::new()),
                ..ClassroomChanges::default()
            },
            expected_revision: None,
        })
        .await
        .expect_err("teacher still placed");

    assert_eq!(error.detail_code(), Some("teacher_not_in_roster"));
}

#[rstest]
#[tokio::test]
async fn schedule_for_non_member_is_not_found(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    let mut teachers = MockTeacherRepository::new();
    teachers.expect_find().return_once(|_| {
        Ok(Some(
            NewTeacher::try_new("Stranger", "stranger@school.test")
                .expect("fixture")
                .into_teacher(OUTSIDER),
        ))
    });

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .get_teacher_schedule(ADMIN, &org_id(), OUTSIDER)
        .await
        .expect_err("not a member");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.detail_code(), Some("not_a_member"));
}

#[rstest]
#[tokio::test]
async fn schedule_reflects_current_grids(mut organisation: Organisation) {
    for (period, subject) in [(2, "Math"), (5, "Science")] {
        organisation
            .set_cell(
                &classroom_id(),
                GridAddress::new(0, period),
                Cell::new([MATH_TEACHER], [subject]),
            )
            .expect("fixture cell");
    }
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(MATH_TEACHER, &["Math", "Science"]))));

    let service = make_service(organisations, teachers, allow_all());
    let schedule = service
        .get_teacher_schedule(ADMIN, &org_id(), MATH_TEACHER)
        .await
        .expect("schedule");

    assert_eq!(schedule.slots.len(), 30);
    assert_eq!(schedule.occupied(), 2);
    let slot = schedule.slots[5].as_ref().expect("slot 5 occupied");
    assert!(slot.subjects.contains("Science"));
}

#[rstest]
#[tokio::test]
async fn list_teachers_filters_by_subject_and_activity() {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(|_| Ok(Some(organisation_with_shape(5, 6))));
    let mut inactive = member(OUTSIDER, &["Math"]);
    inactive.is_active = false;
    let found = vec![
        member(MATH_TEACHER, &["Math"]),
        member(ADMIN, &["English"]),
        inactive,
    ];
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find_by_organisation()
        .return_once(move |_| Ok(found));

    let service = make_service(organisations, teachers, allow_all());
    let listed = service
        .list_organisation_teachers(ListTeachersRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            subject: Some(" Math ".to_owned()),
            class: None,
            active_only: true,
        })
        .await
        .expect("listed");

    let ids: Vec<TeacherId> = listed.iter().map(|teacher| teacher.id).collect();
    assert_eq!(ids, vec![MATH_TEACHER]);
}

#[rstest]
#[tokio::test]
async fn list_teachers_filters_by_class() {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(|_| Ok(Some(organisation_with_shape(5, 6))));
    let mut upper_school = member(ADMIN, &["English"]);
    upper_school
        .membership_mut(&org_id())
        .expect("fixture membership")
        .replace_assignments(["English"], ["9C"])
        .expect("fixture assignments");
    let found = vec![member(MATH_TEACHER, &["Math"]), upper_school];
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find_by_organisation()
        .return_once(move |_| Ok(found));

    let service = make_service(organisations, teachers, allow_all());
    let listed = service
        .list_organisation_teachers(ListTeachersRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            subject: None,
            class: Some("9C".to_owned()),
            active_only: false,
        })
        .await
        .expect("listed");

    let ids: Vec<TeacherId> = listed.iter().map(|teacher| teacher.id).collect();
    assert_eq!(ids, vec![ADMIN]);
}

#[rstest]
#[tokio::test]
async fn list_organisations_shows_administered_and_viewable_ones() {
    let annex = OrganisationId::new("annex").expect("fixture id");
    let elsewhere = OrganisationId::new("elsewhere").expect("fixture id");
    let stored = vec![
        Organisation::new(annex.clone(), "Annex", MATH_TEACHER, GridShape::default()),
        Organisation::new(elsewhere, "Elsewhere", ADMIN, GridShape::default()),
        organisation_with_shape(5, 6),
    ];
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_list()
        .times(1)
        .return_once(move || Ok(stored));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(MATH_TEACHER, &["Math"]))));

    let service = make_service(organisations, teachers, MockAccessPolicy::new());
    let listed = service
        .list_organisations(MATH_TEACHER)
        .await
        .expect("listed");

    let ids: Vec<&OrganisationId> = listed
        .iter()
        .map(|organisation| &organisation.organisation_id)
        .collect();
    assert_eq!(ids, vec![&annex, &org_id()]);
}

#[rstest]
#[tokio::test]
async fn list_organisations_is_empty_for_deactivated_teachers() {
    let mut organisations = MockOrganisationRepository::new();
    organisations.expect_list().times(0);
    let mut teachers = MockTeacherRepository::new();
    teachers.expect_find().return_once(|_| {
        let mut teacher = member(MATH_TEACHER, &["Math"]);
        teacher.is_active = false;
        Ok(Some(teacher))
    });

    let service = make_service(organisations, teachers, MockAccessPolicy::new());
    let listed = service
        .list_organisations(MATH_TEACHER)
        .await
        .expect("listed");

    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn add_membership_is_withdrawn_when_the_organisation_vanishes(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_find().times(1).return_once(|_| Ok(None));
    organisations.expect_save().times(0);
    let newcomer = NewTeacher::try_new("New", "new@school.test")
        .expect("fixture")
        .into_teacher(OUTSIDER);
    let mut enrolled = newcomer.clone();
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(newcomer)));
    teachers
        .expect_save()
        .withf(|saved, expected| *expected == 1 && saved.membership(&org_id()).is_some())
        .times(1)
        .return_once(|_, _| Ok(()));
    enrolled
        .add_membership(
            TeacherMembership::new(
                org_id(),
                ["Art"],
                ["7A"],
                MembershipPermissions::default(),
                joined_timestamp(),
            )
            .expect("fixture membership"),
        )
        .expect("fixture enrolment");
    enrolled.revision = 2;
    teachers
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(enrolled)));
    teachers
        .expect_save()
        .withf(|saved, expected| *expected == 2 && saved.memberships().is_empty())
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .add_membership(AddMembershipRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            teacher_id: OUTSIDER,
            subjects: vec!["Art".to_owned()],
            classes: vec!["7A".to_owned()],
            permissions: MembershipPermissions::default(),
        })
        .await
        .expect_err("organisation deleted mid-way");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.detail_code(), Some("organisation_not_found"));
}

#[rstest]
#[tokio::test]
async fn add_membership_stamps_join_time_and_extends_roster(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .times(2)
        .returning(move |_| Ok(Some(organisation.clone())));
    organisations
        .expect_save()
        .withf(|saved, _| saved.teachers.contains(&OUTSIDER))
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut teachers = MockTeacherRepository::new();
    teachers.expect_find().return_once(|_| {
        Ok(Some(
            NewTeacher::try_new("New", "new@school.test")
                .expect("fixture")
                .into_teacher(OUTSIDER),
        ))
    });
    teachers
        .expect_save()
        .withf(|saved, expected| *expected == 1 && saved.revision == 2)
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, teachers, allow_all());
    let teacher = service
        .add_membership(AddMembershipRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            teacher_id: OUTSIDER,
            subjects: vec!["Art".to_owned()],
            classes: vec!["7A".to_owned()],
            permissions: MembershipPermissions::default(),
        })
        .await
        .expect("membership added");

    let membership = teacher.membership(&org_id()).expect("membership");
    assert_eq!(membership.joined_at(), joined_timestamp());
    assert!(membership.teaches("Art"));
}

#[rstest]
#[tokio::test]
async fn add_membership_requires_subjects(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    let mut teachers = MockTeacherRepository::new();
    teachers.expect_save().times(0);

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .add_membership(AddMembershipRequest {
            actor: ADMIN,
            organisation_id: org_id(),
            teacher_id: OUTSIDER,
            subjects: vec!["  ".to_owned()],
            classes: vec!["7A".to_owned()],
            permissions: MembershipPermissions::default(),
        })
        .await
        .expect_err("no subjects");

    assert_eq!(detail_field(&error), Some("subjects"));
}

#[rstest]
#[tokio::test]
async fn remove_membership_refuses_scheduled_teachers(mut organisation: Organisation) {
    organisation
        .set_cell(
            &classroom_id(),
            GridAddress::new(2, 3),
            Cell::new([MATH_TEACHER], ["Math"]),
        )
        .expect("fixture cell");
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_save().times(0);
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(MATH_TEACHER, &["Math"]))));
    teachers.expect_save().times(0);

    let service = make_service(organisations, teachers, allow_all());
    let error = service
        .remove_membership(ADMIN, &org_id(), MATH_TEACHER)
        .await
        .expect_err("still scheduled");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("teacher_still_scheduled"));
}

#[rstest]
#[tokio::test]
async fn remove_membership_clears_rosters(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations
        .expect_save()
        .withf(|saved, _| {
            !saved.teachers.contains(&MATH_TEACHER)
                && saved
                    .classrooms()
                    .iter()
                    .all(|classroom| !classroom.assigned_teachers.contains(&MATH_TEACHER))
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find()
        .times(2)
        .returning(|_| Ok(Some(member(MATH_TEACHER, &["Math"]))));
    teachers
        .expect_save()
        .withf(|saved, _| saved.memberships().is_empty())
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, teachers, allow_all());
    service
        .remove_membership(ADMIN, &org_id(), MATH_TEACHER)
        .await
        .expect("membership removed");
}

#[rstest]
#[tokio::test]
async fn delete_organisation_strips_memberships(organisation: Organisation) {
    let mut organisations = MockOrganisationRepository::new();
    organisations
        .expect_find()
        .return_once(move |_| Ok(Some(organisation)));
    organisations.expect_delete().times(1).return_once(|_| Ok(true));
    let mut teachers = MockTeacherRepository::new();
    teachers
        .expect_find_by_organisation()
        .return_once(|_| Ok(vec![member(MATH_TEACHER, &["Math"])]));
    teachers
        .expect_find()
        .return_once(|_| Ok(Some(member(MATH_TEACHER, &["Math"]))));
    teachers
        .expect_save()
        .withf(|saved, _| saved.memberships().is_empty())
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(organisations, teachers, allow_all());
    service
        .delete_organisation(ADMIN, &org_id())
        .await
        .expect("deleted");
}
